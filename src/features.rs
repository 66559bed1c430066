use ndarray::Array2;

use crate::error::ConfigError;
use crate::player::{Feature, PlayerRecord};

/// Numeric feature table for one position group. Rows follow the input
/// record order; columns follow the requested feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub features: Vec<Feature>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }
}

/// Resolves column names against the stat catalogue, then builds the matrix.
pub fn build_feature_matrix<S: AsRef<str>>(
    records: &[PlayerRecord],
    feature_names: &[S],
) -> Result<FeatureMatrix, ConfigError> {
    let features = feature_names
        .iter()
        .map(|name| {
            name.as_ref()
                .parse::<Feature>()
                .map_err(|_| ConfigError::UnknownFeature(name.as_ref().trim().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    matrix_from_features(records, &features)
}

/// Non-finite values (NaN, ±inf) become 0.0.
pub fn matrix_from_features(
    records: &[PlayerRecord],
    features: &[Feature],
) -> Result<FeatureMatrix, ConfigError> {
    if features.is_empty() {
        return Err(ConfigError::EmptyFeatureList("<requested>".to_string()));
    }
    let values = Array2::from_shape_fn((records.len(), features.len()), |(row, col)| {
        finite_or_zero(features[col].value(&records[row]))
    });
    Ok(FeatureMatrix {
        features: features.to_vec(),
        values,
    })
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_become_zero() {
        let records = vec![
            PlayerRecord::new("A")
                .with_stat(Feature::ShotPerGame, f64::NAN)
                .with_stat(Feature::KeyPassPerGame, 2.0),
            PlayerRecord::new("B")
                .with_stat(Feature::ShotPerGame, f64::INFINITY)
                .with_stat(Feature::KeyPassPerGame, f64::NEG_INFINITY),
        ];
        let m = build_feature_matrix(&records, &["shot_per_game", "key_pass_per_game"]).unwrap();
        assert_eq!(m.values[(0, 0)], 0.0);
        assert_eq!(m.values[(0, 1)], 2.0);
        assert_eq!(m.values[(1, 0)], 0.0);
        assert_eq!(m.values[(1, 1)], 0.0);
        assert!(m.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn columns_follow_requested_order() {
        let records = vec![
            PlayerRecord::new("A")
                .with_stat(Feature::Age, 24.0)
                .with_stat(Feature::ClearancePerGame, 3.5),
        ];
        let m = build_feature_matrix(&records, &["clearance_per_game", "age"]).unwrap();
        assert_eq!(m.column_names(), vec!["clearance_per_game", "age"]);
        assert_eq!(m.values.row(0).to_vec(), vec![3.5, 24.0]);
    }

    #[test]
    fn unknown_or_empty_feature_list_is_a_config_error() {
        let records = vec![PlayerRecord::new("A")];
        assert_eq!(
            build_feature_matrix(&records, &["goal_per_game", "xg"]),
            Err(ConfigError::UnknownFeature("xg".to_string()))
        );
        let none: [&str; 0] = [];
        assert!(matches!(
            build_feature_matrix(&records, &none),
            Err(ConfigError::EmptyFeatureList(_))
        ));
    }
}
