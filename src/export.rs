use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::by_position::SeasonAnalysis;
use crate::clustering::ClusteringResult;
use crate::positions::PositionGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub groups: usize,
    pub sweep_rows: usize,
    pub members: usize,
}

/// Writes a season's analysis to an xlsx workbook: every bandwidth trial
/// (`Sweep`), the chosen runs per group (`Best`) and each clustered player
/// with their best-silhouette label and 2-D coordinates (`Members`).
pub fn export_analysis(path: &Path, analysis: &SeasonAnalysis) -> Result<ExportReport> {
    let mut sweep_rows = vec![header(&[
        "season",
        "group",
        "bandwidth",
        "n_clusters",
        "silhouette",
        "davies_bouldin",
    ])];
    let mut best_rows = vec![header(&[
        "season",
        "group",
        "players",
        "best_silhouette_bandwidth",
        "best_silhouette_clusters",
        "silhouette",
        "best_db_bandwidth",
        "best_db_clusters",
        "davies_bouldin",
        "same_bandwidth",
    ])];
    let mut member_rows = vec![header(&[
        "season", "group", "player", "team", "nationality", "position", "cluster", "pca_1",
        "pca_2",
    ])];

    let mut groups = 0usize;
    for (group, result) in analysis.iter() {
        let Some(result) = result else {
            continue;
        };
        groups += 1;
        push_sweep(&mut sweep_rows, &analysis.season, group, result);
        push_best(&mut best_rows, &analysis.season, group, result);
        push_members(&mut member_rows, &analysis.season, group, result);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Sweep")?;
        write_rows(sheet, &sweep_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Best")?;
        write_rows(sheet, &best_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Members")?;
        write_rows(sheet, &member_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        groups,
        sweep_rows: sweep_rows.len().saturating_sub(1),
        members: member_rows.len().saturating_sub(1),
    })
}

fn push_sweep(out: &mut Vec<Vec<String>>, season: &str, group: PositionGroup, r: &ClusteringResult) {
    for run in &r.runs {
        out.push(vec![
            season.to_string(),
            group.label().to_string(),
            format!("{:.1}", run.bandwidth),
            run.n_clusters.to_string(),
            opt_score(run.silhouette),
            opt_score(run.davies_bouldin),
        ]);
    }
}

fn push_best(out: &mut Vec<Vec<String>>, season: &str, group: PositionGroup, r: &ClusteringResult) {
    let cohesion = r.best_by_cohesion();
    let compact = r.best_by_compactness();
    out.push(vec![
        season.to_string(),
        group.label().to_string(),
        r.meta.len().to_string(),
        cohesion.map(|b| format!("{:.1}", b.bandwidth)).unwrap_or_default(),
        cohesion.map(|b| b.n_clusters.to_string()).unwrap_or_default(),
        opt_score(cohesion.and_then(|b| b.silhouette)),
        compact.map(|b| format!("{:.1}", b.bandwidth)).unwrap_or_default(),
        compact.map(|b| b.n_clusters.to_string()).unwrap_or_default(),
        opt_score(compact.and_then(|b| b.davies_bouldin)),
        r.same_bandwidth().to_string(),
    ]);
}

fn push_members(
    out: &mut Vec<Vec<String>>,
    season: &str,
    group: PositionGroup,
    r: &ClusteringResult,
) {
    let labels = r.best_by_cohesion().map(|b| b.labels.as_slice());
    for (idx, p) in r.meta.iter().enumerate() {
        let coords = r.embedding.coords.row(idx);
        out.push(vec![
            season.to_string(),
            group.label().to_string(),
            p.player.clone(),
            p.team.clone().unwrap_or_default(),
            p.nationality.clone().unwrap_or_default(),
            p.position.clone().unwrap_or_default(),
            labels
                .and_then(|l| l.get(idx))
                .map(|c| format!("C{c}"))
                .unwrap_or_default(),
            format!("{:.4}", coords[0]),
            format!("{:.4}", coords[1]),
        ]);
    }
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn opt_score(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.4}")).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
