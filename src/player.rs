use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One player's season snapshot as stored for a league dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerRecord {
    #[serde(default)]
    pub id: i64,
    pub player: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub appearance: u32,
    #[serde(default)]
    pub total_minute: u32,
    #[serde(default)]
    pub total_goal: u32,
    #[serde(default)]
    pub goal_per_game: f64,
    #[serde(default)]
    pub shot_per_game: f64,
    #[serde(default)]
    pub sot_per_game: f64,
    #[serde(default)]
    pub assist: u32,
    #[serde(default)]
    pub assist_per_game: f64,
    #[serde(default)]
    pub successful_dribble_per_game: f64,
    #[serde(default)]
    pub key_pass_per_game: f64,
    #[serde(default)]
    pub successful_pass_per_game: f64,
    #[serde(default)]
    pub long_ball_per_game: f64,
    #[serde(default)]
    pub successful_crossing_per_game: f64,
    #[serde(default)]
    pub ball_recovered_per_game: f64,
    #[serde(default)]
    pub dribbled_past_per_game: f64,
    #[serde(default)]
    pub clearance_per_game: f64,
    #[serde(default)]
    pub error: u32,
    #[serde(default)]
    pub error_per_game: f64,
    #[serde(default)]
    pub total_duel_per_game: f64,
    #[serde(default)]
    pub aerial_duel_per_game: f64,
}

impl PlayerRecord {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = Some(position.to_string());
        self
    }

    pub fn with_nationality(mut self, nationality: &str) -> Self {
        self.nationality = Some(nationality.to_string());
        self
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    /// Sets a numeric stat by feature. Count stats are rounded to the nearest
    /// non-negative integer.
    pub fn with_stat(mut self, feature: Feature, value: f64) -> Self {
        feature.set(&mut self, value);
        self
    }
}

/// Every numeric stat a player row carries, keyed by its dataset column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    Appearance,
    TotalMinute,
    TotalGoal,
    GoalPerGame,
    ShotPerGame,
    SotPerGame,
    Assist,
    AssistPerGame,
    SuccessfulDribblePerGame,
    KeyPassPerGame,
    SuccessfulPassPerGame,
    LongBallPerGame,
    SuccessfulCrossingPerGame,
    BallRecoveredPerGame,
    DribbledPastPerGame,
    ClearancePerGame,
    Error,
    ErrorPerGame,
    TotalDuelPerGame,
    AerialDuelPerGame,
}

impl Feature {
    pub const ALL: [Feature; 21] = [
        Feature::Age,
        Feature::Appearance,
        Feature::TotalMinute,
        Feature::TotalGoal,
        Feature::GoalPerGame,
        Feature::ShotPerGame,
        Feature::SotPerGame,
        Feature::Assist,
        Feature::AssistPerGame,
        Feature::SuccessfulDribblePerGame,
        Feature::KeyPassPerGame,
        Feature::SuccessfulPassPerGame,
        Feature::LongBallPerGame,
        Feature::SuccessfulCrossingPerGame,
        Feature::BallRecoveredPerGame,
        Feature::DribbledPastPerGame,
        Feature::ClearancePerGame,
        Feature::Error,
        Feature::ErrorPerGame,
        Feature::TotalDuelPerGame,
        Feature::AerialDuelPerGame,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Appearance => "appearance",
            Feature::TotalMinute => "total_minute",
            Feature::TotalGoal => "total_goal",
            Feature::GoalPerGame => "goal_per_game",
            Feature::ShotPerGame => "shot_per_game",
            Feature::SotPerGame => "sot_per_game",
            Feature::Assist => "assist",
            Feature::AssistPerGame => "assist_per_game",
            Feature::SuccessfulDribblePerGame => "successful_dribble_per_game",
            Feature::KeyPassPerGame => "key_pass_per_game",
            Feature::SuccessfulPassPerGame => "successful_pass_per_game",
            Feature::LongBallPerGame => "long_ball_per_game",
            Feature::SuccessfulCrossingPerGame => "successful_crossing_per_game",
            Feature::BallRecoveredPerGame => "ball_recovered_per_game",
            Feature::DribbledPastPerGame => "dribbled_past_per_game",
            Feature::ClearancePerGame => "clearance_per_game",
            Feature::Error => "error",
            Feature::ErrorPerGame => "error_per_game",
            Feature::TotalDuelPerGame => "total_duel_per_game",
            Feature::AerialDuelPerGame => "aerial_duel_per_game",
        }
    }

    /// Whole-number season totals (and age) as opposed to per-game rates.
    pub fn is_count(self) -> bool {
        matches!(
            self,
            Feature::Age
                | Feature::Appearance
                | Feature::TotalMinute
                | Feature::TotalGoal
                | Feature::Assist
                | Feature::Error
        )
    }

    pub fn value(self, record: &PlayerRecord) -> f64 {
        match self {
            Feature::Age => record.age as f64,
            Feature::Appearance => record.appearance as f64,
            Feature::TotalMinute => record.total_minute as f64,
            Feature::TotalGoal => record.total_goal as f64,
            Feature::GoalPerGame => record.goal_per_game,
            Feature::ShotPerGame => record.shot_per_game,
            Feature::SotPerGame => record.sot_per_game,
            Feature::Assist => record.assist as f64,
            Feature::AssistPerGame => record.assist_per_game,
            Feature::SuccessfulDribblePerGame => record.successful_dribble_per_game,
            Feature::KeyPassPerGame => record.key_pass_per_game,
            Feature::SuccessfulPassPerGame => record.successful_pass_per_game,
            Feature::LongBallPerGame => record.long_ball_per_game,
            Feature::SuccessfulCrossingPerGame => record.successful_crossing_per_game,
            Feature::BallRecoveredPerGame => record.ball_recovered_per_game,
            Feature::DribbledPastPerGame => record.dribbled_past_per_game,
            Feature::ClearancePerGame => record.clearance_per_game,
            Feature::Error => record.error as f64,
            Feature::ErrorPerGame => record.error_per_game,
            Feature::TotalDuelPerGame => record.total_duel_per_game,
            Feature::AerialDuelPerGame => record.aerial_duel_per_game,
        }
    }

    fn set(self, record: &mut PlayerRecord, value: f64) {
        let count = || {
            if value.is_finite() && value > 0.0 {
                value.round() as u32
            } else {
                0
            }
        };
        match self {
            Feature::Age => record.age = count(),
            Feature::Appearance => record.appearance = count(),
            Feature::TotalMinute => record.total_minute = count(),
            Feature::TotalGoal => record.total_goal = count(),
            Feature::GoalPerGame => record.goal_per_game = value,
            Feature::ShotPerGame => record.shot_per_game = value,
            Feature::SotPerGame => record.sot_per_game = value,
            Feature::Assist => record.assist = count(),
            Feature::AssistPerGame => record.assist_per_game = value,
            Feature::SuccessfulDribblePerGame => record.successful_dribble_per_game = value,
            Feature::KeyPassPerGame => record.key_pass_per_game = value,
            Feature::SuccessfulPassPerGame => record.successful_pass_per_game = value,
            Feature::LongBallPerGame => record.long_ball_per_game = value,
            Feature::SuccessfulCrossingPerGame => record.successful_crossing_per_game = value,
            Feature::BallRecoveredPerGame => record.ball_recovered_per_game = value,
            Feature::DribbledPastPerGame => record.dribbled_past_per_game = value,
            Feature::ClearancePerGame => record.clearance_per_game = value,
            Feature::Error => record.error = count(),
            Feature::ErrorPerGame => record.error_per_game = value,
            Feature::TotalDuelPerGame => record.total_duel_per_game = value,
            Feature::AerialDuelPerGame => record.aerial_duel_per_game = value,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.name() == key)
            .ok_or_else(|| format!("unknown feature `{}`", s.trim()))
    }
}

/// Stats shown side by side when comparing an anchor with a recommended player.
pub const COMPARISON_FEATURES: [Feature; 18] = [
    Feature::Age,
    Feature::Appearance,
    Feature::TotalMinute,
    Feature::TotalGoal,
    Feature::Assist,
    Feature::ShotPerGame,
    Feature::SotPerGame,
    Feature::SuccessfulDribblePerGame,
    Feature::KeyPassPerGame,
    Feature::SuccessfulPassPerGame,
    Feature::LongBallPerGame,
    Feature::SuccessfulCrossingPerGame,
    Feature::BallRecoveredPerGame,
    Feature::DribbledPastPerGame,
    Feature::ClearancePerGame,
    Feature::Error,
    Feature::TotalDuelPerGame,
    Feature::AerialDuelPerGame,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_round_trip_through_parse() {
        for f in Feature::ALL {
            assert_eq!(f.name().parse::<Feature>(), Ok(f));
        }
        assert_eq!(" Key_Pass_Per_Game ".parse::<Feature>(), Ok(Feature::KeyPassPerGame));
        assert!("xg_per_game".parse::<Feature>().is_err());
    }

    #[test]
    fn count_stats_round_and_clamp() {
        let p = PlayerRecord::new("A")
            .with_stat(Feature::Appearance, 11.6)
            .with_stat(Feature::Error, -2.0)
            .with_stat(Feature::ShotPerGame, 1.25);
        assert_eq!(p.appearance, 12);
        assert_eq!(p.error, 0);
        assert_eq!(Feature::ShotPerGame.value(&p), 1.25);
    }

    #[test]
    fn record_deserializes_with_missing_stats() {
        let raw = r#"{"player":"Marc Klok","position":"DM","nationality":"Indonesia","age":31}"#;
        let p: PlayerRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(p.player, "Marc Klok");
        assert_eq!(p.age, 31);
        assert_eq!(p.team, None);
        assert_eq!(p.clearance_per_game, 0.0);
    }
}
