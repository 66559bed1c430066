use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, MeanShiftParams};
use crate::error::{ClusterError, ScoutError};
use crate::features::{FeatureMatrix, matrix_from_features};
use crate::mean_shift::{Seeding, mean_shift};
use crate::metrics::{davies_bouldin_score, silhouette_score};
use crate::player::{Feature, PlayerRecord};
use crate::preprocess::{Embedding2D, StandardizedMatrix, preprocess};

/// One bandwidth trial of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringRun {
    pub bandwidth: f64,
    #[serde(skip)]
    pub seeding: Seeding,
    #[serde(skip)]
    pub labels: Vec<usize>,
    pub n_clusters: usize,
    pub silhouette: Option<f64>,
    pub davies_bouldin: Option<f64>,
}

/// Everything one position group's analysis produced. Rows of `meta`,
/// `features`, `standardized` and `embedding` are aligned.
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    pub runs: Vec<ClusteringRun>,
    best_silhouette: Option<usize>,
    best_davies_bouldin: Option<usize>,
    pub features: FeatureMatrix,
    pub standardized: StandardizedMatrix,
    pub embedding: Embedding2D,
    pub meta: Vec<PlayerRecord>,
}

impl ClusteringResult {
    /// Highest silhouette across the sweep.
    pub fn best_by_cohesion(&self) -> Option<&ClusteringRun> {
        self.best_silhouette.map(|idx| &self.runs[idx])
    }

    /// Lowest Davies-Bouldin index across the sweep.
    pub fn best_by_compactness(&self) -> Option<&ClusteringRun> {
        self.best_davies_bouldin.map(|idx| &self.runs[idx])
    }

    /// Both criteria picked the same bandwidth. False when either is absent.
    pub fn same_bandwidth(&self) -> bool {
        match (self.best_by_cohesion(), self.best_by_compactness()) {
            (Some(a), Some(b)) => a.bandwidth == b.bandwidth,
            _ => false,
        }
    }

    pub fn has_usable_clustering(&self) -> bool {
        self.best_silhouette.is_some()
    }

    /// Case-insensitive exact name lookup; first match wins.
    pub fn row_of(&self, player: &str) -> Option<usize> {
        let wanted = player.to_lowercase();
        self.meta.iter().position(|p| p.player.to_lowercase() == wanted)
    }
}

/// Standardizes, projects and sweeps one set of player rows.
pub fn cluster_players(
    records: Vec<PlayerRecord>,
    features: &[Feature],
    config: &AnalysisConfig,
) -> Result<ClusteringResult, ScoutError> {
    let matrix = matrix_from_features(&records, features)?;
    let (standardized, embedding) = preprocess(&matrix)?;
    let runs = bandwidth_sweep(&standardized, &config.bandwidths, &config.mean_shift)?;
    let (best_silhouette, best_davies_bouldin) = select_best(&runs);

    Ok(ClusteringResult {
        runs,
        best_silhouette,
        best_davies_bouldin,
        features: matrix,
        standardized,
        embedding,
        meta: records,
    })
}

/// Runs mean shift once per bandwidth, in the given order. A bandwidth where
/// both seeding strategies fail aborts the whole sweep.
pub fn bandwidth_sweep(
    xs: &StandardizedMatrix,
    bandwidths: &[f64],
    params: &MeanShiftParams,
) -> Result<Vec<ClusteringRun>, ClusterError> {
    let x = xs.values.view();
    let mut runs = Vec::with_capacity(bandwidths.len());

    for &bandwidth in bandwidths {
        let (fit, seeding) = match mean_shift(x, bandwidth, Seeding::Binned, params) {
            Ok(fit) => (fit, Seeding::Binned),
            Err(binned) => {
                warn!(bandwidth, error = %binned, "binned seeding failed, retrying with every row as a seed");
                match mean_shift(x, bandwidth, Seeding::AllPoints, params) {
                    Ok(fit) => (fit, Seeding::AllPoints),
                    Err(all_points) => {
                        return Err(ClusterError {
                            bandwidth,
                            binned: binned.to_string(),
                            all_points: all_points.to_string(),
                        });
                    }
                }
            }
        };

        let n_clusters = fit.n_clusters();
        let (silhouette, davies_bouldin) = if n_clusters >= 2 {
            let sil = silhouette_score(x, &fit.labels)
                .inspect_err(|e| warn!(bandwidth, error = %e, "silhouette unavailable"))
                .ok();
            let dbi = davies_bouldin_score(x, &fit.labels)
                .inspect_err(|e| warn!(bandwidth, error = %e, "davies-bouldin unavailable"))
                .ok();
            (sil, dbi)
        } else {
            (None, None)
        };
        debug!(bandwidth, n_clusters, ?silhouette, ?davies_bouldin, "bandwidth trial");

        runs.push(ClusteringRun {
            bandwidth,
            seeding,
            labels: fit.labels,
            n_clusters,
            silhouette,
            davies_bouldin,
        });
    }

    Ok(runs)
}

/// Index of the max-silhouette run and of the min-Davies-Bouldin run. Ties
/// keep the earliest run.
pub fn select_best(runs: &[ClusteringRun]) -> (Option<usize>, Option<usize>) {
    let mut best_sil: Option<(usize, f64)> = None;
    let mut best_dbi: Option<(usize, f64)> = None;
    for (idx, run) in runs.iter().enumerate() {
        if let Some(s) = run.silhouette {
            if best_sil.is_none_or(|(_, cur)| s > cur) {
                best_sil = Some((idx, s));
            }
        }
        if let Some(d) = run.davies_bouldin {
            if best_dbi.is_none_or(|(_, cur)| d < cur) {
                best_dbi = Some((idx, d));
            }
        }
    }
    (best_sil.map(|(i, _)| i), best_dbi.map(|(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    fn unscaled(values: Array2<f64>) -> StandardizedMatrix {
        let cols = values.ncols();
        StandardizedMatrix {
            values,
            means: Array1::zeros(cols),
            scales: Array1::ones(cols),
        }
    }

    fn run(bandwidth: f64, silhouette: Option<f64>, davies_bouldin: Option<f64>) -> ClusteringRun {
        ClusteringRun {
            bandwidth,
            seeding: Seeding::Binned,
            labels: Vec::new(),
            n_clusters: if silhouette.is_some() { 2 } else { 1 },
            silhouette,
            davies_bouldin,
        }
    }

    #[test]
    fn selection_picks_extremes_and_first_on_ties() {
        let runs = vec![
            run(0.5, Some(0.2), Some(1.1)),
            run(1.0, Some(0.6), Some(0.4)),
            run(1.5, Some(0.6), Some(0.4)),
            run(2.0, None, None),
            run(2.5, Some(0.1), Some(0.9)),
        ];
        assert_eq!(select_best(&runs), (Some(1), Some(1)));
    }

    #[test]
    fn selection_can_disagree() {
        let runs = vec![run(0.5, Some(0.7), Some(0.9)), run(1.0, Some(0.3), Some(0.2))];
        assert_eq!(select_best(&runs), (Some(0), Some(1)));
    }

    #[test]
    fn nothing_scored_means_nothing_selected() {
        let runs = vec![run(0.5, None, None), run(1.0, None, None)];
        assert_eq!(select_best(&runs), (None, None));
        assert_eq!(select_best(&[]), (None, None));
    }

    #[test]
    fn sweep_retries_with_every_row_when_bins_miss() {
        // Every bin center lands out of reach of its members at this width.
        let xs = unscaled(array![[0.24; 8], [0.20; 8], [0.26; 8]]);
        let runs = bandwidth_sweep(&xs, &[0.5, 4.5], &MeanShiftParams::default()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].seeding, Seeding::AllPoints);
        assert_eq!(runs[0].n_clusters, 1);
        assert_eq!(runs[0].labels, vec![0, 0, 0]);
        assert_eq!(runs[0].silhouette, None);
        assert_eq!(runs[1].seeding, Seeding::Binned);
    }

    #[test]
    fn non_finite_input_aborts_the_whole_sweep() {
        let xs = unscaled(array![[f64::NAN, 0.0], [1.0, 1.0], [2.0, 0.5]]);
        let err = bandwidth_sweep(&xs, &[0.5, 1.0], &MeanShiftParams::default()).unwrap_err();
        assert_eq!(err.bandwidth, 0.5);
        assert!(err.binned.contains("non-finite"));
        assert!(err.all_points.contains("non-finite"));
    }
}
