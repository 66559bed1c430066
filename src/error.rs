use thiserror::Error;

/// Caller misuse: bad position codes, feature lists or analysis settings.
/// Never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid position code `{0}`")]
    InvalidPosition(String),

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    #[error("no features configured for position group {0}")]
    EmptyFeatureList(String),

    #[error("position code `{code}` is claimed by both {first} and {second}")]
    OverlappingCodes {
        code: String,
        first: String,
        second: String,
    },

    #[error("need at least {min_rows} rows and {min_cols} columns, got {rows}x{cols}")]
    MatrixTooSmall {
        rows: usize,
        cols: usize,
        min_rows: usize,
        min_cols: usize,
    },

    #[error("validation error for field `{field}`: {message}")]
    Validation { field: String, message: String },
}

/// Standardizing or projecting a group's feature matrix failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PreprocessError {
    #[error(transparent)]
    Shape(#[from] ConfigError),

    #[error("standard scaling failed: {0}")]
    Scaling(String),

    #[error("principal component projection failed: {0}")]
    Projection(String),
}

/// Both seeding strategies failed for one bandwidth; the group's sweep is aborted.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("clustering failed at bandwidth {bandwidth}: binned seeding: {binned}; all-point seeding: {all_points}")]
pub struct ClusterError {
    pub bandwidth: f64,
    pub binned: String,
    pub all_points: String,
}

/// A validity score could not be computed for an otherwise successful clustering.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricError {
    #[error("number of labels is {labels}; valid values are 2 to n_samples - 1 ({samples} samples)")]
    LabelCount { labels: usize, samples: usize },

    #[error("label vector has {labels} entries but the matrix has {rows} rows")]
    Shape { labels: usize, rows: usize },

    #[error("score is not finite")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Clustering(#[from] ClusterError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ScoutError {
    /// True for errors a user should act on by fixing input or settings, as
    /// opposed to source outages.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            ScoutError::Config(_) | ScoutError::Preprocess(_) | ScoutError::Clustering(_)
        )
    }
}

pub type Result<T, E = ScoutError> = std::result::Result<T, E>;
