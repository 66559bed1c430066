use linfa::DatasetBase;
use linfa::traits::{Fit, Predict, Transformer};
use linfa_preprocessing::linear_scaling::LinearScaler;
use linfa_reduction::Pca;
use ndarray::{Array1, Array2, Axis};

use crate::error::{ConfigError, PreprocessError};
use crate::features::FeatureMatrix;

const MIN_ROWS: usize = 2;
const MIN_COLS: usize = 2;

/// Zero-mean, unit-variance copy of a feature matrix. Clustering and
/// similarity both work in this space.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedMatrix {
    pub values: Array2<f64>,
    pub means: Array1<f64>,
    pub scales: Array1<f64>,
}

impl StandardizedMatrix {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }
}

/// Two principal components of the standardized matrix, for plotting only.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding2D {
    pub coords: Array2<f64>,
    pub explained_variance_ratio: [f64; 2],
}

pub fn preprocess(
    matrix: &FeatureMatrix,
) -> Result<(StandardizedMatrix, Embedding2D), PreprocessError> {
    let (rows, cols) = matrix.values.dim();
    if rows < MIN_ROWS || cols < MIN_COLS {
        return Err(ConfigError::MatrixTooSmall {
            rows,
            cols,
            min_rows: MIN_ROWS,
            min_cols: MIN_COLS,
        }
        .into());
    }
    let standardized = standardize(&matrix.values)?;
    let embedding = pca_2d(&standardized.values)?;
    Ok((standardized, embedding))
}

/// Population variance; constant columns keep a unit scale and end up all zero.
pub fn standardize(values: &Array2<f64>) -> Result<StandardizedMatrix, PreprocessError> {
    let dataset = DatasetBase::from(values.clone());
    let scaler = LinearScaler::<f64>::standard()
        .fit(&dataset)
        .map_err(|e| PreprocessError::Scaling(e.to_string()))?;
    let mut standardized = scaler.transform(values.clone());

    let means = scaler.offsets().clone();
    // The scaler keeps inverse deviations.
    let mut scales = scaler.scales().mapv(|inv| 1.0 / inv);
    for (col, scale) in scales.iter_mut().enumerate() {
        if !(*scale > 10.0 * f64::EPSILON * means[col].abs().max(1.0)) {
            *scale = 1.0;
            standardized.column_mut(col).fill(0.0);
        }
    }

    Ok(StandardizedMatrix {
        values: standardized,
        means,
        scales,
    })
}

/// Projects onto the two leading principal components. Each component is
/// oriented so its largest-magnitude coordinate is positive, keeping the plot
/// stable across runs. A matrix with no spread projects to the origin.
pub fn pca_2d(values: &Array2<f64>) -> Result<Embedding2D, PreprocessError> {
    let rows = values.nrows();
    let spread = values
        .mean_axis(Axis(0))
        .map(|means| values.rows().into_iter().any(|row| row != means))
        .unwrap_or(false);
    if !spread {
        return Ok(Embedding2D {
            coords: Array2::zeros((rows, 2)),
            explained_variance_ratio: [0.0; 2],
        });
    }

    let dataset = DatasetBase::from(values.clone());
    let pca = Pca::params(2)
        .fit(&dataset)
        .map_err(|e| PreprocessError::Projection(e.to_string()))?;
    let mut coords: Array2<f64> = pca.predict(values);
    for mut component in coords.columns_mut() {
        let pivot = component
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            component.mapv_inplace(|v| -v);
        }
    }

    let mut ratio = [0.0; 2];
    for (slot, value) in pca.explained_variance_ratio().iter().take(2).enumerate() {
        if value.is_finite() {
            ratio[slot] = *value;
        }
    }

    Ok(Embedding2D {
        coords,
        explained_variance_ratio: ratio,
    })
}
