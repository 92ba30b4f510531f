//! Tunable rule constants for a match.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TacticsError};
use crate::math::{fixed_decimal_serde, Fixed};

/// Rule constants shared by the combat resolver, turn controller and AI.
///
/// Every field has a default, so a RON file only needs to list overrides:
///
/// ```ron
/// RulesConfig(
///     max_fire_range: 10,
///     miss_offset_radius: 0.8,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// AP spent by an aimed shot.
    pub fire_ap_cost: u32,

    /// Maximum Manhattan distance of an aimed shot.
    pub max_fire_range: u32,

    /// Maximum Manhattan distance at which an overwatching unit reacts.
    pub overwatch_range: u32,

    /// AP spent to enter overwatch.
    pub overwatch_ap_cost: u32,

    /// AP spent to reload.
    pub reload_ap_cost: u32,

    /// Radius (world units) of the scatter applied to missed shots.
    #[serde(with = "fixed_decimal_serde")]
    pub miss_offset_radius: Fixed,

    /// Destinations tried by an AI unit that has no target to approach.
    pub random_walk_attempts: u32,

    /// Actions one AI activation may take before it passes.
    pub max_ai_actions_per_turn: u32,

    /// Reject overwatch for classes without `can_overwatch` and make the AI
    /// skip cover seeking for classes without `can_take_cover`.
    pub enforce_capabilities: bool,

    /// Rounds after which the match is declared a draw. `None` plays on
    /// until one side is wiped out.
    pub round_limit: Option<u32>,

    /// Round limit applied when both sides are on autopilot and
    /// `round_limit` is unset.
    pub autopilot_round_limit: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            fire_ap_cost: 1,
            max_fire_range: 8,
            overwatch_range: 8,
            overwatch_ap_cost: 1,
            reload_ap_cost: 1,
            miss_offset_radius: Fixed::from_num(0.6),
            random_walk_attempts: 20,
            max_ai_actions_per_turn: 32,
            enforce_capabilities: false,
            round_limit: None,
            autopilot_round_limit: 200,
        }
    }
}

impl RulesConfig {
    /// Parse rules from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::DataParseError`] if the text is not valid RON.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        ron::from_str(ron_text).map_err(|e| TacticsError::DataParseError {
            what: "rules".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_skirmish_rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.fire_ap_cost, 1);
        assert_eq!(rules.max_fire_range, 8);
        assert_eq!(rules.overwatch_range, 8);
        assert_eq!(rules.overwatch_ap_cost, 1);
        assert_eq!(rules.reload_ap_cost, 1);
        assert_eq!(rules.random_walk_attempts, 20);
        assert!(!rules.enforce_capabilities);
        assert_eq!(rules.autopilot_round_limit, 200);
    }

    #[test]
    fn test_partial_ron_overrides() {
        let rules =
            RulesConfig::from_ron_str("(max_fire_range: 10, miss_offset_radius: 0.5)").unwrap();
        assert_eq!(rules.max_fire_range, 10);
        assert_eq!(rules.miss_offset_radius, Fixed::from_num(0.5));
        assert_eq!(rules.overwatch_range, 8);
        assert_eq!(rules.round_limit, None);

        let limited = RulesConfig::from_ron_str("(round_limit: Some(30))").unwrap();
        assert_eq!(limited.round_limit, Some(30));
    }

    #[test]
    fn test_invalid_ron() {
        assert!(RulesConfig::from_ron_str("(max_fire_range: -3)").is_err());
    }
}
