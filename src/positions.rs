use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionGroup {
    Forward,
    Midfielder,
    Defender,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 3] = [
        PositionGroup::Forward,
        PositionGroup::Midfielder,
        PositionGroup::Defender,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PositionGroup::Forward => "Forward",
            PositionGroup::Midfielder => "Midfielder",
            PositionGroup::Defender => "Defender",
        }
    }

    pub fn default_codes(self) -> &'static [&'static str] {
        match self {
            PositionGroup::Forward => &["ST", "LW", "RW"],
            PositionGroup::Midfielder => &["AM", "CM", "DM", "LM", "RM"],
            PositionGroup::Defender => &["CB", "LB", "RB"],
        }
    }

    pub fn default_features(self) -> &'static [Feature] {
        match self {
            PositionGroup::Forward => &[
                Feature::GoalPerGame,
                Feature::ShotPerGame,
                Feature::SotPerGame,
                Feature::AssistPerGame,
                Feature::SuccessfulDribblePerGame,
                Feature::SuccessfulCrossingPerGame,
                Feature::KeyPassPerGame,
                Feature::TotalDuelPerGame,
                Feature::AerialDuelPerGame,
            ],
            PositionGroup::Midfielder => &[
                Feature::ShotPerGame,
                Feature::SotPerGame,
                Feature::AssistPerGame,
                Feature::KeyPassPerGame,
                Feature::SuccessfulPassPerGame,
                Feature::LongBallPerGame,
                Feature::SuccessfulDribblePerGame,
                Feature::BallRecoveredPerGame,
                Feature::TotalDuelPerGame,
                Feature::DribbledPastPerGame,
                Feature::ClearancePerGame,
            ],
            PositionGroup::Defender => &[
                Feature::ClearancePerGame,
                Feature::BallRecoveredPerGame,
                Feature::DribbledPastPerGame,
                Feature::SuccessfulDribblePerGame,
                Feature::LongBallPerGame,
                Feature::AerialDuelPerGame,
                Feature::TotalDuelPerGame,
            ],
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Splits a free-text position ("ST/LW", "cb, rb", "AM - CM") into uppercase
/// letter tokens. Anything that is not an ASCII letter separates tokens.
pub fn pos_tokens(position: Option<&str>) -> BTreeSet<String> {
    let Some(raw) = position else {
        return BTreeSet::new();
    };
    raw.to_ascii_uppercase()
        .split(|c: char| !c.is_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn tokens_intersect(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.iter().any(|t| b.contains(t))
}

/// True when the two position strings share at least one token.
pub fn positions_match(a: Option<&str>, b: Option<&str>) -> bool {
    tokens_intersect(&pos_tokens(a), &pos_tokens(b))
}

/// Coarse group membership: does the player's position hit any of the
/// group's codes.
pub fn position_in_codes(position: Option<&str>, codes: &[String]) -> bool {
    let tokens = pos_tokens(position);
    codes
        .iter()
        .any(|code| tokens.contains(&code.trim().to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokens_split_on_any_non_letter() {
        assert_eq!(pos_tokens(Some("ST/LW")), set(&["ST", "LW"]));
        assert_eq!(pos_tokens(Some("  cb ")), set(&["CB"]));
        assert_eq!(pos_tokens(Some("AM, cm-DM")), set(&["AM", "CM", "DM"]));
        assert_eq!(pos_tokens(Some("RB2")), set(&["RB"]));
        assert!(pos_tokens(None).is_empty());
        assert!(pos_tokens(Some(" / ")).is_empty());
    }

    #[test]
    fn matching_is_symmetric() {
        let cases = [
            (Some("ST/LW"), Some("lw")),
            (Some("CB"), Some("LB, RB")),
            (None, Some("CM")),
            (Some("DM"), Some("DM,CM")),
        ];
        for (a, b) in cases {
            assert_eq!(positions_match(a, b), positions_match(b, a));
        }
        assert!(positions_match(Some("ST/LW"), Some("lw")));
        assert!(!positions_match(Some("CB"), Some("LB, RB")));
        assert!(!positions_match(None, None));
    }

    #[test]
    fn group_membership_uses_whole_tokens() {
        let codes: Vec<String> = PositionGroup::Defender
            .default_codes()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert!(position_in_codes(Some("cb"), &codes));
        assert!(position_in_codes(Some("DM/RB"), &codes));
        assert!(!position_in_codes(Some("LWB"), &codes));
        assert!(!position_in_codes(None, &codes));
    }
}
