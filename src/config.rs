use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::player::Feature;
use crate::positions::PositionGroup;

const CACHE_DIR: &str = "liga_scout";
const DB_FILE: &str = "players.sqlite";

pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_DOMESTIC_NATIONALITY: &str = "Indonesia";

/// 0.5, 1.0, ..., 4.5
pub fn default_bandwidth_grid() -> Vec<f64> {
    (1..=9).map(|step| step as f64 * 0.5).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub group: PositionGroup,
    pub codes: Vec<String>,
    pub features: Vec<String>,
}

impl GroupSpec {
    pub fn defaults(group: PositionGroup) -> Self {
        Self {
            group,
            codes: group.default_codes().iter().map(|c| c.to_string()).collect(),
            features: group
                .default_features()
                .iter()
                .map(|f| f.name().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanShiftParams {
    pub max_iter: usize,
    /// Convergence threshold as a fraction of the bandwidth.
    pub stop_thresh_factor: f64,
    /// Minimum points per grid bin for a bin to become a seed.
    pub min_bin_freq: usize,
}

impl Default for MeanShiftParams {
    fn default() -> Self {
        Self {
            max_iter: 300,
            stop_thresh_factor: 1e-3,
            min_bin_freq: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_bandwidth_grid")]
    pub bandwidths: Vec<f64>,
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_domestic_nationality")]
    pub domestic_nationality: String,
    #[serde(default)]
    pub mean_shift: MeanShiftParams,
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupSpec>,
}

fn default_min_group_size() -> usize {
    DEFAULT_MIN_GROUP_SIZE
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_domestic_nationality() -> String {
    DEFAULT_DOMESTIC_NATIONALITY.to_string()
}

fn default_groups() -> Vec<GroupSpec> {
    PositionGroup::ALL.into_iter().map(GroupSpec::defaults).collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bandwidths: default_bandwidth_grid(),
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            default_top_n: DEFAULT_TOP_N,
            domestic_nationality: default_domestic_nationality(),
            mean_shift: MeanShiftParams::default(),
            groups: default_groups(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults, then an optional JSON file from `SCOUT_CONFIG_PATH`, then
    /// individual `SCOUT_*` overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match config_path_override() {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("read analysis config {}", path.display()))?;
                serde_json::from_str::<AnalysisConfig>(&raw)
                    .with_context(|| format!("parse analysis config {}", path.display()))?
            }
            None => AnalysisConfig::default(),
        };

        if let Some(n) = env_parse::<usize>("SCOUT_TOP_N") {
            cfg.default_top_n = n;
        }
        if let Some(n) = env_parse::<usize>("SCOUT_MIN_GROUP_SIZE") {
            cfg.min_group_size = n;
        }
        if let Ok(raw) = env::var("SCOUT_DOMESTIC_NATIONALITY") {
            if !raw.trim().is_empty() {
                cfg.domestic_nationality = raw.trim().to_string();
            }
        }

        cfg.validate().context("invalid analysis config")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bandwidths.is_empty() {
            return Err(validation("bandwidths", "at least one bandwidth is required"));
        }
        if let Some(bw) = self.bandwidths.iter().find(|bw| !bw.is_finite() || **bw <= 0.0) {
            return Err(validation("bandwidths", &format!("{bw} is not a positive bandwidth")));
        }
        if self.min_group_size < 3 {
            return Err(validation("min_group_size", "must be at least 3"));
        }
        if self.mean_shift.max_iter == 0 {
            return Err(validation("mean_shift.max_iter", "must be positive"));
        }

        let mut owners: HashMap<String, PositionGroup> = HashMap::new();
        for group in PositionGroup::ALL {
            let spec = self.spec(group)?;
            self.features_for(group)?;
            for code in &spec.codes {
                let code = code.trim().to_ascii_uppercase();
                if let Some(first) = owners.get(&code) {
                    if *first != group {
                        return Err(ConfigError::OverlappingCodes {
                            code,
                            first: first.to_string(),
                            second: group.to_string(),
                        });
                    }
                }
                owners.insert(code, group);
            }
        }
        Ok(())
    }

    pub fn spec(&self, group: PositionGroup) -> Result<&GroupSpec, ConfigError> {
        self.groups
            .iter()
            .find(|g| g.group == group)
            .ok_or_else(|| ConfigError::EmptyFeatureList(group.to_string()))
    }

    /// The ordered clustering features for a group, resolved against the
    /// player record's stat catalogue.
    pub fn features_for(&self, group: PositionGroup) -> Result<Vec<Feature>, ConfigError> {
        let spec = self.spec(group)?;
        if spec.features.is_empty() {
            return Err(ConfigError::EmptyFeatureList(group.to_string()));
        }
        spec.features
            .iter()
            .map(|name| {
                name.parse::<Feature>()
                    .map_err(|_| ConfigError::UnknownFeature(name.clone()))
            })
            .collect()
    }

    /// Maps an exact position code ("st", " CB ") to the group owning it.
    pub fn group_for_code(&self, code: &str) -> Result<PositionGroup, ConfigError> {
        let wanted = code.trim().to_ascii_uppercase();
        PositionGroup::ALL
            .into_iter()
            .find(|group| {
                self.spec(*group)
                    .map(|spec| spec.codes.iter().any(|c| c.trim().eq_ignore_ascii_case(&wanted)))
                    .unwrap_or(false)
            })
            .ok_or(ConfigError::InvalidPosition(code.trim().to_string()))
    }
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse::<T>().ok())
}

fn config_path_override() -> Option<PathBuf> {
    env::var("SCOUT_CONFIG_PATH")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SCOUT_DB_PATH") {
        if !raw.trim().is_empty() {
            return Some(PathBuf::from(raw.trim()));
        }
    }
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_nine_ascending_steps() {
        let grid = default_bandwidth_grid();
        assert_eq!(grid, vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5]);
    }

    #[test]
    fn defaults_validate() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn group_for_code_is_exact_and_case_insensitive() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.group_for_code(" st "), Ok(PositionGroup::Forward));
        assert_eq!(cfg.group_for_code("DM"), Ok(PositionGroup::Midfielder));
        assert_eq!(cfg.group_for_code("rb"), Ok(PositionGroup::Defender));
        assert_eq!(
            cfg.group_for_code("GK"),
            Err(ConfigError::InvalidPosition("GK".to_string()))
        );
        assert!(cfg.group_for_code("ST/LW").is_err());
    }

    #[test]
    fn overlapping_codes_are_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.groups[0].codes.push("dm".to_string());
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingCodes { ref code, .. } if code == "DM"));
    }

    #[test]
    fn empty_and_unknown_features_are_config_errors() {
        let mut cfg = AnalysisConfig::default();
        cfg.groups[2].features.clear();
        assert_eq!(
            cfg.features_for(PositionGroup::Defender),
            Err(ConfigError::EmptyFeatureList("Defender".to_string()))
        );

        let mut cfg = AnalysisConfig::default();
        cfg.groups[0].features.push("xg_per_game".to_string());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UnknownFeature("xg_per_game".to_string()))
        );
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"default_top_n": 10}"#).unwrap();
        assert_eq!(cfg.default_top_n, 10);
        assert_eq!(cfg.bandwidths.len(), 9);
        assert_eq!(cfg.groups.len(), 3);
        assert_eq!(cfg.domestic_nationality, "Indonesia");
    }
}
