pub mod by_position;
pub mod cache;
pub mod clustering;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod mean_shift;
pub mod metrics;
pub mod player;
pub mod positions;
pub mod preprocess;
pub mod profile;
pub mod recommend;
pub mod source;
pub mod store;
