use std::collections::HashMap;

use tracing::debug;

use crate::by_position::cluster_group;
use crate::clustering::ClusteringResult;
use crate::config::AnalysisConfig;
use crate::error::ScoutError;
use crate::positions::PositionGroup;
use crate::source::PlayerSource;

/// Caller-owned memo of clustering results keyed by (season, group).
/// Switching the active season drops everything computed for the old one.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    season: Option<String>,
    entries: HashMap<(String, PositionGroup), Option<ClusteringResult>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn season(&self) -> Option<&str> {
        self.season.as_deref()
    }

    /// Makes `season` active. Returns true if that invalidated entries.
    pub fn set_season(&mut self, season: &str) -> bool {
        if self.season.as_deref() == Some(season) {
            return false;
        }
        let had_entries = !self.entries.is_empty();
        self.entries.clear();
        self.season = Some(season.to_string());
        had_entries
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn invalidate_group(&mut self, season: &str, group: PositionGroup) {
        self.entries.remove(&(season.to_string(), group));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, season: &str, group: PositionGroup) -> bool {
        self.entries.contains_key(&(season.to_string(), group))
    }

    /// Returns the cached result or clusters the group now. Absent results
    /// (too few players) are cached too. Errors are not cached.
    pub fn get_or_compute(
        &mut self,
        source: &dyn PlayerSource,
        config: &AnalysisConfig,
        season: &str,
        group: PositionGroup,
    ) -> Result<Option<&ClusteringResult>, ScoutError> {
        self.set_season(season);
        let key = (season.to_string(), group);
        if !self.entries.contains_key(&key) {
            debug!(season, group = %group, "analysis cache miss");
            let records = source.players_by_season(season)?;
            let result = if records.is_empty() {
                None
            } else {
                cluster_group(&records, group, config)?
            };
            self.entries.insert(key.clone(), result);
        }
        Ok(self.entries.get(&key).and_then(|r| r.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn season_switch_invalidates() {
        let source = MemorySource::new();
        let cfg = AnalysisConfig::default();
        let mut cache = AnalysisCache::new();

        assert!(cache.get_or_compute(&source, &cfg, "2023", PositionGroup::Forward).unwrap().is_none());
        assert!(cache.contains("2023", PositionGroup::Forward));
        assert_eq!(cache.season(), Some("2023"));

        assert!(!cache.set_season("2023"));
        assert!(cache.set_season("2024"));
        assert!(cache.is_empty());
    }
}
