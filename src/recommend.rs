use ndarray::ArrayView1;
use serde::Serialize;
use tracing::debug;

use crate::by_position::cluster_group;
use crate::cache::AnalysisCache;
use crate::clustering::ClusteringResult;
use crate::config::AnalysisConfig;
use crate::error::ScoutError;
use crate::positions::{pos_tokens, tokens_intersect};
use crate::source::PlayerSource;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub season: String,
    /// Exact position code naming the anchor's group, e.g. "ST" or "CB".
    pub position_code: String,
    pub anchor: String,
    pub top_n: usize,
    /// Keep only players of the configured domestic nationality.
    pub domestic_only: bool,
    /// Keep only players sharing a position token with the anchor.
    pub match_position: bool,
}

impl RecommendRequest {
    pub fn new(season: &str, position_code: &str, anchor: &str, top_n: usize) -> Self {
        Self {
            season: season.to_string(),
            position_code: position_code.to_string(),
            anchor: anchor.to_string(),
            top_n,
            domestic_only: false,
            match_position: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub id: i64,
    pub player: String,
    pub team: Option<String>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub age: u32,
    pub appearance: u32,
    pub total_minute: u32,
    pub cluster: usize,
    pub similarity: f64,
}

/// Clusters the anchor's group from scratch and ranks its cluster mates.
pub fn recommend_similar_players(
    source: &dyn PlayerSource,
    config: &AnalysisConfig,
    request: &RecommendRequest,
) -> Result<Vec<RecommendationRow>, ScoutError> {
    config.validate()?;
    let group = config.group_for_code(&request.position_code)?;
    let records = source.players_by_season(&request.season)?;
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let Some(result) = cluster_group(&records, group, config)? else {
        return Ok(Vec::new());
    };
    Ok(rank_cluster_mates(&result, request, &config.domestic_nationality))
}

/// Same as [`recommend_similar_players`] but reuses clustering held in the
/// caller's cache.
pub fn recommend_cached(
    cache: &mut AnalysisCache,
    source: &dyn PlayerSource,
    config: &AnalysisConfig,
    request: &RecommendRequest,
) -> Result<Vec<RecommendationRow>, ScoutError> {
    config.validate()?;
    let group = config.group_for_code(&request.position_code)?;
    let Some(result) = cache.get_or_compute(source, config, &request.season, group)? else {
        return Ok(Vec::new());
    };
    Ok(rank_cluster_mates(result, request, &config.domestic_nationality))
}

/// Ranks the anchor's cluster mates (best-silhouette labelling) by cosine
/// similarity in standardized space. Empty when there is nothing to
/// recommend.
pub fn rank_cluster_mates(
    result: &ClusteringResult,
    request: &RecommendRequest,
    domestic_nationality: &str,
) -> Vec<RecommendationRow> {
    let Some(best) = result.best_by_cohesion() else {
        return Vec::new();
    };
    let Some(anchor_idx) = result.row_of(&request.anchor) else {
        debug!(anchor = %request.anchor, "anchor not in group");
        return Vec::new();
    };
    let labels = &best.labels;
    let anchor_cluster = labels[anchor_idx];

    // Candidates include the anchor until the very end.
    let mut candidates: Vec<usize> = (0..labels.len())
        .filter(|i| labels[*i] == anchor_cluster)
        .collect();
    if candidates.len() <= 1 {
        return Vec::new();
    }

    if request.domestic_only {
        let wanted = domestic_nationality.trim().to_lowercase();
        candidates.retain(|i| {
            result.meta[*i]
                .nationality
                .as_deref()
                .is_some_and(|n| n.trim().to_lowercase() == wanted)
        });
        if candidates.len() <= 1 {
            return Vec::new();
        }
    }

    if request.match_position {
        let anchor_tokens = pos_tokens(result.meta[anchor_idx].position.as_deref());
        candidates.retain(|i| {
            tokens_intersect(&pos_tokens(result.meta[*i].position.as_deref()), &anchor_tokens)
        });
    }

    let xs = &result.standardized.values;
    let anchor_vec = xs.row(anchor_idx);
    let mut rows: Vec<RecommendationRow> = candidates
        .into_iter()
        .filter(|i| *i != anchor_idx)
        .map(|i| {
            let p = &result.meta[i];
            RecommendationRow {
                id: p.id,
                player: p.player.clone(),
                team: p.team.clone(),
                nationality: p.nationality.clone(),
                position: p.position.clone(),
                age: p.age,
                appearance: p.appearance,
                total_minute: p.total_minute,
                cluster: labels[i],
                similarity: cosine_similarity(anchor_vec, xs.row(i)),
            }
        })
        .collect();

    // Stable: equal scores keep row order.
    rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    rows.truncate(request.top_n);
    rows
}

/// Cosine of the angle between two vectors; 0 when either has zero length.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn cosine_basics() {
        let a = array![1.0, 2.0, -1.0];
        let b = array![2.0, 4.0, -2.0];
        assert!((cosine_similarity(a.view(), b.view()) - 1.0).abs() < 1e-12);
        let c = array![-1.0, -2.0, 1.0];
        assert!((cosine_similarity(a.view(), c.view()) + 1.0).abs() < 1e-12);
        let z = array![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(a.view(), z.view()), 0.0);
        let o = array![2.0, -1.0, 0.0];
        assert!(cosine_similarity(a.view(), o.view()).abs() < 1e-12);
    }
}
