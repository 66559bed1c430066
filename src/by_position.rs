use std::collections::BTreeMap;

use tracing::info;

use crate::clustering::{ClusteringResult, cluster_players};
use crate::config::AnalysisConfig;
use crate::error::ScoutError;
use crate::player::PlayerRecord;
use crate::positions::{PositionGroup, position_in_codes};
use crate::source::PlayerSource;

/// Per-group clustering for one season. A group is absent when it had too
/// few players (or the season had none at all).
#[derive(Debug, Clone)]
pub struct SeasonAnalysis {
    pub season: String,
    groups: BTreeMap<PositionGroup, Option<ClusteringResult>>,
}

impl SeasonAnalysis {
    pub fn empty(season: &str) -> Self {
        Self {
            season: season.to_string(),
            groups: PositionGroup::ALL.into_iter().map(|g| (g, None)).collect(),
        }
    }

    pub fn get(&self, group: PositionGroup) -> Option<&ClusteringResult> {
        self.groups.get(&group).and_then(|r| r.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (PositionGroup, Option<&ClusteringResult>)> + '_ {
        self.groups.iter().map(|(g, r)| (*g, r.as_ref()))
    }

    pub fn insert(&mut self, group: PositionGroup, result: Option<ClusteringResult>) {
        self.groups.insert(group, result);
    }

    pub fn take(&mut self, group: PositionGroup) -> Option<ClusteringResult> {
        self.groups.get_mut(&group).and_then(Option::take)
    }
}

/// Rows whose position shares a token with any of the group's codes, in
/// input order. A player listed as "DM, CB" lands in both groups.
pub fn players_in_group(records: &[PlayerRecord], codes: &[String]) -> Vec<PlayerRecord> {
    records
        .iter()
        .filter(|p| position_in_codes(p.position.as_deref(), codes))
        .cloned()
        .collect()
}

pub fn cluster_group(
    records: &[PlayerRecord],
    group: PositionGroup,
    config: &AnalysisConfig,
) -> Result<Option<ClusteringResult>, ScoutError> {
    let spec = config.spec(group)?;
    let features = config.features_for(group)?;
    let members = players_in_group(records, &spec.codes);
    if members.len() < config.min_group_size {
        info!(
            group = %group,
            players = members.len(),
            min = config.min_group_size,
            "skipping group: not enough players"
        );
        return Ok(None);
    }

    let players = members.len();
    let result = cluster_players(members, &features, config)?;
    info!(
        group = %group,
        players,
        best_bandwidth = ?result.best_by_cohesion().map(|r| r.bandwidth),
        best_clusters = ?result.best_by_cohesion().map(|r| r.n_clusters),
        "group clustered"
    );
    Ok(Some(result))
}

pub fn cluster_records_by_position(
    season: &str,
    records: &[PlayerRecord],
    config: &AnalysisConfig,
) -> Result<SeasonAnalysis, ScoutError> {
    config.validate()?;
    let mut analysis = SeasonAnalysis::empty(season);
    if records.is_empty() {
        info!(season, "no players for season");
        return Ok(analysis);
    }
    for group in PositionGroup::ALL {
        analysis.insert(group, cluster_group(records, group, config)?);
    }
    Ok(analysis)
}

/// Fetches the season and clusters each position group independently.
pub fn cluster_by_position(
    source: &dyn PlayerSource,
    season: &str,
    config: &AnalysisConfig,
) -> Result<SeasonAnalysis, ScoutError> {
    let records = source.players_by_season(season)?;
    cluster_records_by_position(season, &records, config)
}
