use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use liga_scout::config;
use liga_scout::player::PlayerRecord;
use liga_scout::store::SqliteStore;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let league = arg_value(&args, "--league").ok_or_else(|| anyhow!("--league is required"))?;
    let season = arg_value(&args, "--season").ok_or_else(|| anyhow!("--season is required"))?;
    let file = arg_value(&args, "--file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--file is required"))?;

    let raw = fs::read_to_string(&file)
        .with_context(|| format!("read player file {}", file.display()))?;
    let records: Vec<PlayerRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parse player file {}", file.display()))?;
    info!(players = records.len(), file = %file.display(), "loaded player rows");

    let mut store = SqliteStore::open(&db_path)?;
    let summary = store.replace_dataset(&league, &season, &records)?;

    println!("Player ingest complete");
    println!("DB: {}", db_path.display());
    println!("League: {league}");
    println!("Season: {season}");
    println!("Players inserted: {}", summary.players_inserted);
    if summary.replaced {
        println!("Replaced previous upload (dataset {})", summary.dataset_id);
    }

    Ok(())
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
