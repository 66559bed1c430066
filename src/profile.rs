use serde::Serialize;
use thiserror::Error;

use crate::clustering::ClusteringResult;
use crate::player::{Feature, PlayerRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("no best-silhouette clustering available")]
    NoBestClustering,

    #[error("feature `{0}` is not part of this group's clustering features")]
    FeatureNotClustered(String),

    #[error("no feature rows for player `{0}`")]
    PlayerNotFound(String),
}

/// Mean raw value of one feature inside one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterFeatureMean {
    pub cluster: String,
    pub feature: Feature,
    pub mean: f64,
}

/// One stat of one player, long form, for side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub feature: Feature,
    pub player: String,
    pub value: f64,
}

/// Per-cluster means of raw (unstandardized) features under the
/// best-silhouette labelling. Clusters ascend, features keep the given
/// order.
pub fn cluster_feature_profile(
    result: &ClusteringResult,
    features: &[Feature],
) -> Result<Vec<ClusterFeatureMean>, ProfileError> {
    let best = result.best_by_cohesion().ok_or(ProfileError::NoBestClustering)?;
    let columns = features
        .iter()
        .map(|f| {
            result
                .features
                .features
                .iter()
                .position(|c| c == f)
                .ok_or_else(|| ProfileError::FeatureNotClustered(f.name().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut clusters: Vec<usize> = best.labels.clone();
    clusters.sort_unstable();
    clusters.dedup();

    let mut out = Vec::with_capacity(clusters.len() * features.len());
    for cluster in clusters {
        let rows: Vec<usize> = (0..best.labels.len())
            .filter(|i| best.labels[*i] == cluster)
            .collect();
        for (feature, col) in features.iter().zip(&columns) {
            let sum: f64 = rows.iter().map(|r| result.features.values[(*r, *col)]).sum();
            out.push(ClusterFeatureMean {
                cluster: format!("C{cluster}"),
                feature: *feature,
                mean: sum / rows.len() as f64,
            });
        }
    }
    Ok(out)
}

/// Anchor's stats followed by the target's, both by exact name.
pub fn compare_players(
    records: &[PlayerRecord],
    anchor: &str,
    target: &str,
    features: &[Feature],
) -> Result<Vec<ComparisonRow>, ProfileError> {
    let find = |name: &str| {
        records
            .iter()
            .find(|p| p.player == name)
            .ok_or_else(|| ProfileError::PlayerNotFound(name.to_string()))
    };
    let a = find(anchor)?;
    let t = find(target)?;

    Ok([a, t]
        .into_iter()
        .flat_map(|p| {
            features.iter().map(move |f| ComparisonRow {
                feature: *f,
                player: p.player.clone(),
                value: f.value(p),
            })
        })
        .collect())
}
