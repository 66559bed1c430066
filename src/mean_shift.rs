//! Flat-kernel mean shift: every seed climbs to the mean of the points within
//! `bandwidth` until it stops moving, near-duplicate modes are merged in
//! order of how many points support them, and every row is labelled with its
//! nearest surviving mode.

use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

use crate::config::MeanShiftParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeding {
    /// One seed per occupied grid cell of side `bandwidth`.
    Binned,
    /// Every row is a seed.
    AllPoints,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeanShiftError {
    #[error("input matrix has no rows")]
    Empty,

    #[error("input matrix contains non-finite values")]
    NonFinite,

    #[error("bandwidth must be positive and finite, got {0}")]
    Bandwidth(f64),

    #[error("no point was within bandwidth={0} of any seed")]
    NoSupportedSeed(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanShiftFit {
    pub labels: Vec<usize>,
    pub centers: Array2<f64>,
}

impl MeanShiftFit {
    pub fn n_clusters(&self) -> usize {
        self.centers.nrows()
    }
}

pub fn mean_shift(
    x: ArrayView2<f64>,
    bandwidth: f64,
    seeding: Seeding,
    params: &MeanShiftParams,
) -> Result<MeanShiftFit, MeanShiftError> {
    if x.nrows() == 0 {
        return Err(MeanShiftError::Empty);
    }
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(MeanShiftError::Bandwidth(bandwidth));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(MeanShiftError::NonFinite);
    }

    let seeds = match seeding {
        Seeding::Binned => bin_seeds(x, bandwidth, params.min_bin_freq),
        Seeding::AllPoints => x.to_owned(),
    };

    let stop_thresh = params.stop_thresh_factor * bandwidth;
    let mut modes: Vec<(Array1<f64>, usize)> = Vec::new();
    for seed in seeds.rows() {
        if let Some((mode, support)) =
            climb_from_seed(x, seed, bandwidth, stop_thresh, params.max_iter)
        {
            modes.push((mode, support));
        }
    }
    if modes.is_empty() {
        return Err(MeanShiftError::NoSupportedSeed(bandwidth));
    }

    // Highest support first; ties broken by the larger center, lexicographically.
    modes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| lex_cmp(b.0.view(), a.0.view())));

    let mut keep = vec![true; modes.len()];
    for i in 0..modes.len() {
        if !keep[i] {
            continue;
        }
        for j in 0..modes.len() {
            if j != i && distance(modes[i].0.view(), modes[j].0.view()) <= bandwidth {
                keep[j] = false;
            }
        }
    }

    let survivors: Vec<&Array1<f64>> = modes
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|((c, _), _)| c)
        .collect();
    let mut centers = Array2::<f64>::zeros((survivors.len(), x.ncols()));
    for (row, c) in survivors.iter().enumerate() {
        centers.row_mut(row).assign(*c);
    }

    let raw: Vec<usize> = x
        .rows()
        .into_iter()
        .map(|row| nearest_center(row, centers.view()))
        .collect();

    // Drop modes no row ended up nearest to, keeping labels dense.
    let mut used = vec![false; centers.nrows()];
    for l in &raw {
        used[*l] = true;
    }
    let mut remap = vec![0usize; centers.nrows()];
    let mut kept_rows = Vec::new();
    for (idx, is_used) in used.iter().enumerate() {
        if *is_used {
            remap[idx] = kept_rows.len();
            kept_rows.push(idx);
        }
    }
    let centers = centers.select(Axis(0), &kept_rows);
    let labels = raw.iter().map(|l| remap[*l]).collect();

    Ok(MeanShiftFit { labels, centers })
}

/// Returns the converged mode and how many rows sat within the bandwidth on
/// the last step, or `None` if the seed had no rows in reach.
fn climb_from_seed(
    x: ArrayView2<f64>,
    seed: ArrayView1<f64>,
    bandwidth: f64,
    stop_thresh: f64,
    max_iter: usize,
) -> Option<(Array1<f64>, usize)> {
    let mut mean = seed.to_owned();
    let mut support = 0usize;
    let mut iterations = 0usize;
    loop {
        let mut sum = Array1::<f64>::zeros(x.ncols());
        let mut within = 0usize;
        for row in x.rows() {
            if distance(row, mean.view()) <= bandwidth {
                sum += &row;
                within += 1;
            }
        }
        if within == 0 {
            break;
        }
        support = within;
        let next = sum / within as f64;
        let shift = distance(next.view(), mean.view());
        mean = next;
        if shift <= stop_thresh || iterations == max_iter {
            break;
        }
        iterations += 1;
    }
    (support > 0).then_some((mean, support))
}

/// Grid cells of side `bin_size`; cells holding at least `min_freq` rows
/// become seeds at the cell center. Falls back to all rows when binning does
/// not reduce the seed count.
fn bin_seeds(x: ArrayView2<f64>, bin_size: f64, min_freq: usize) -> Array2<f64> {
    let mut order: Vec<Vec<i64>> = Vec::new();
    let mut counts: HashMap<Vec<i64>, usize> = HashMap::new();
    for row in x.rows() {
        let key: Vec<i64> = row
            .iter()
            .map(|v| (v / bin_size).round_ties_even() as i64)
            .collect();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let kept: Vec<&Vec<i64>> = order
        .iter()
        .filter(|key| counts.get(*key).copied().unwrap_or(0) >= min_freq)
        .collect();
    if kept.len() == x.nrows() {
        return x.to_owned();
    }

    let mut seeds = Array2::<f64>::zeros((kept.len(), x.ncols()));
    for (row, key) in kept.iter().enumerate() {
        for (col, cell) in key.iter().enumerate() {
            seeds[(row, col)] = *cell as f64 * bin_size;
        }
    }
    seeds
}

fn nearest_center(row: ArrayView1<f64>, centers: ArrayView2<f64>) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (idx, c) in centers.rows().into_iter().enumerate() {
        let d = distance(row, c);
        if d < best_dist {
            best = idx;
            best_dist = d;
        }
    }
    best
}

pub(crate) fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn lex_cmp(a: ArrayView1<f64>, b: ArrayView1<f64>) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.total_cmp(y);
        if ord.is_ne() {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}
