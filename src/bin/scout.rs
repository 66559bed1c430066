use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use liga_scout::by_position::cluster_by_position;
use liga_scout::config::{self, AnalysisConfig};
use liga_scout::export::export_analysis;
use liga_scout::player::COMPARISON_FEATURES;
use liga_scout::profile::{cluster_feature_profile, compare_players};
use liga_scout::recommend::{RecommendRequest, rank_cluster_mates};
use liga_scout::source::PlayerSource;
use liga_scout::store::SqliteStore;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = AnalysisConfig::from_env()?;
    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;

    let season = match arg_value(&args, "--season") {
        Some(season) => season,
        None => store
            .seasons()?
            .pop()
            .ok_or_else(|| anyhow!("no seasons in {}; run scout_ingest first", db_path.display()))?,
    };

    let analysis = cluster_by_position(&store, &season, &cfg)?;

    println!("Season: {season}");
    for (group, result) in analysis.iter() {
        println!();
        let Some(result) = result else {
            println!("{group}: not enough players (min {})", cfg.min_group_size);
            continue;
        };
        println!("{group}: {} players", result.meta.len());
        println!("  bandwidth  clusters  silhouette  davies_bouldin");
        for run in &result.runs {
            println!(
                "  {:>9.1}  {:>8}  {:>10}  {:>14}",
                run.bandwidth,
                run.n_clusters,
                fmt_score(run.silhouette),
                fmt_score(run.davies_bouldin)
            );
        }
        match (result.best_by_cohesion(), result.best_by_compactness()) {
            (Some(s), Some(d)) => {
                println!(
                    "  best silhouette: bandwidth {:.1} ({} clusters)",
                    s.bandwidth, s.n_clusters
                );
                println!(
                    "  best davies-bouldin: bandwidth {:.1} ({} clusters)",
                    d.bandwidth, d.n_clusters
                );
                if result.same_bandwidth() {
                    println!("  both scores agree");
                }
            }
            _ => println!("  no bandwidth produced two or more clusters"),
        }

        if has_flag(&args, "--profile") && result.has_usable_clustering() {
            match cluster_feature_profile(result, &result.features.features) {
                Ok(rows) => {
                    for row in rows {
                        println!("  {} {:<30} {:.3}", row.cluster, row.feature, row.mean);
                    }
                }
                Err(err) => warn!(group = %group, "profile unavailable: {err}"),
            }
        }
    }

    if let Some(anchor) = arg_value(&args, "--player") {
        let position = arg_value(&args, "--position")
            .ok_or_else(|| anyhow!("--position is required with --player"))?;
        let top_n = match arg_value(&args, "--top") {
            Some(raw) => raw.parse::<usize>().with_context(|| format!("invalid --top `{raw}`"))?,
            None => cfg.default_top_n,
        };
        let mut request = RecommendRequest::new(&season, &position, &anchor, top_n);
        request.domestic_only = has_flag(&args, "--domestic");
        request.match_position = has_flag(&args, "--match-position");

        let group = cfg.group_for_code(&request.position_code)?;
        let rows = analysis
            .get(group)
            .map(|result| rank_cluster_mates(result, &request, &cfg.domestic_nationality))
            .unwrap_or_default();

        println!();
        println!("Players similar to {anchor} ({group}):");
        if rows.is_empty() {
            println!("  none");
        }
        for (idx, row) in rows.iter().enumerate() {
            println!(
                "  {:>2}. {:<28} {:<20} {:<12} {:<10} C{} {:.4}",
                idx + 1,
                row.player,
                row.team.as_deref().unwrap_or("-"),
                row.nationality.as_deref().unwrap_or("-"),
                row.position.as_deref().unwrap_or("-"),
                row.cluster,
                row.similarity
            );
        }

        if has_flag(&args, "--compare") {
            if let (Some(top), Some(result)) = (rows.first(), analysis.get(group)) {
                let comparison =
                    compare_players(&result.meta, &anchor, &top.player, &COMPARISON_FEATURES)?;
                println!();
                println!("{anchor} vs {}:", top.player);
                let half = comparison.len() / 2;
                for (a, t) in comparison[..half].iter().zip(&comparison[half..]) {
                    println!("  {:<30} {:>10.2} {:>10.2}", a.feature, a.value, t.value);
                }
            }
        }
    }

    if let Some(path) = arg_value(&args, "--export") {
        let path = PathBuf::from(path);
        let report = export_analysis(&path, &analysis)?;
        println!();
        println!(
            "Exported {} groups, {} sweep rows, {} members to {}",
            report.groups,
            report.sweep_rows,
            report.members,
            path.display()
        );
    }

    Ok(())
}

fn fmt_score(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("liga_scout=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// `--key=value` or `--key value`.
fn arg_value(args: &[String], key: &str) -> Option<String> {
    let prefix = format!("{key}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == key {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
