use std::collections::BTreeMap;

use anyhow::Result;

use crate::player::PlayerRecord;

/// Read side of the player dataset store.
pub trait PlayerSource {
    /// Every player of the season, sorted by name.
    fn players_by_season(&self, season: &str) -> Result<Vec<PlayerRecord>>;

    /// Names of the season's players whose stored position text contains
    /// `position` (case-insensitive substring), sorted by name.
    fn player_names_by_position(&self, season: &str, position: &str) -> Result<Vec<String>>;

    /// One player's row by exact name.
    fn player_detail(&self, season: &str, player: &str) -> Result<Option<PlayerRecord>>;

    /// Known seasons, ascending.
    fn seasons(&self) -> Result<Vec<String>>;
}

/// In-memory dataset keyed by season. Loading a season replaces it.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    seasons: BTreeMap<String, Vec<PlayerRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season(mut self, season: &str, players: Vec<PlayerRecord>) -> Self {
        self.insert_season(season, players);
        self
    }

    pub fn insert_season(&mut self, season: &str, mut players: Vec<PlayerRecord>) {
        players.sort_by(|a, b| a.player.cmp(&b.player));
        self.seasons.insert(season.trim().to_string(), players);
    }
}

impl PlayerSource for MemorySource {
    fn players_by_season(&self, season: &str) -> Result<Vec<PlayerRecord>> {
        Ok(self.seasons.get(season.trim()).cloned().unwrap_or_default())
    }

    fn player_names_by_position(&self, season: &str, position: &str) -> Result<Vec<String>> {
        let needle = position.trim().to_lowercase();
        Ok(self
            .seasons
            .get(season.trim())
            .into_iter()
            .flatten()
            .filter(|p| {
                p.position
                    .as_deref()
                    .is_some_and(|pos| pos.to_lowercase().contains(&needle))
            })
            .map(|p| p.player.clone())
            .collect())
    }

    fn player_detail(&self, season: &str, player: &str) -> Result<Option<PlayerRecord>> {
        Ok(self
            .seasons
            .get(season.trim())
            .and_then(|rows| rows.iter().find(|p| p.player == player))
            .cloned())
    }

    fn seasons(&self) -> Result<Vec<String>> {
        Ok(self.seasons.keys().cloned().collect())
    }
}
