use ndarray::{Array1, Array2, ArrayView2};

use crate::error::MetricError;
use crate::mean_shift::distance;

/// Mean silhouette coefficient over all rows, in [-1, 1]. Rows alone in
/// their cluster score 0.
pub fn silhouette_score(x: ArrayView2<f64>, labels: &[usize]) -> Result<f64, MetricError> {
    let k = check_labels(x, labels)?;
    let n = x.nrows();

    let mut sizes = vec![0usize; k];
    for l in labels {
        sizes[*l] += 1;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        if sizes[own] <= 1 {
            continue;
        }
        let mut sums = vec![0.0; k];
        for j in 0..n {
            if i != j {
                sums[labels[j]] += distance(x.row(i), x.row(j));
            }
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|c| *c != own && sizes[*c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    finite(total / n as f64)
}

/// Davies-Bouldin index, >= 0, lower is better.
pub fn davies_bouldin_score(x: ArrayView2<f64>, labels: &[usize]) -> Result<f64, MetricError> {
    let k = check_labels(x, labels)?;

    let mut centroids = Array2::<f64>::zeros((k, x.ncols()));
    let mut sizes = vec![0usize; k];
    for (row, l) in x.rows().into_iter().zip(labels) {
        let mut c = centroids.row_mut(*l);
        c += &row;
        sizes[*l] += 1;
    }
    for (c, size) in sizes.iter().enumerate() {
        if *size > 0 {
            let mut row = centroids.row_mut(c);
            row /= *size as f64;
        }
    }

    let mut scatter = Array1::<f64>::zeros(k);
    for (row, l) in x.rows().into_iter().zip(labels) {
        scatter[*l] += distance(row, centroids.row(*l));
    }
    for (c, size) in sizes.iter().enumerate() {
        if *size > 0 {
            scatter[c] /= *size as f64;
        }
    }

    let mut separation = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in 0..k {
            separation[(i, j)] = distance(centroids.row(i), centroids.row(j));
        }
    }

    let tiny = |v: f64| v.abs() < 1e-8;
    if scatter.iter().all(|v| tiny(*v)) || separation.iter().all(|v| tiny(*v)) {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for i in 0..k {
        let worst = (0..k)
            .filter(|j| *j != i)
            .map(|j| {
                let d = separation[(i, j)];
                if d == 0.0 {
                    0.0
                } else {
                    (scatter[i] + scatter[j]) / d
                }
            })
            .fold(0.0, f64::max);
        total += worst;
    }

    finite(total / k as f64)
}

/// Validates shapes and returns the number of distinct labels, which must
/// be between 2 and n - 1. Labels are expected to be dense (0..k).
fn check_labels(x: ArrayView2<f64>, labels: &[usize]) -> Result<usize, MetricError> {
    if labels.len() != x.nrows() {
        return Err(MetricError::Shape {
            labels: labels.len(),
            rows: x.nrows(),
        });
    }
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut seen = vec![false; k];
    for l in labels {
        seen[*l] = true;
    }
    let distinct = seen.iter().filter(|s| **s).count();
    let n = x.nrows();
    if distinct < 2 || distinct + 1 > n || distinct != k {
        return Err(MetricError::LabelCount {
            labels: distinct,
            samples: n,
        });
    }
    Ok(k)
}

fn finite(v: f64) -> Result<f64, MetricError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MetricError::NonFinite)
    }
}
