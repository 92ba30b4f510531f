//! Units and their per-turn resources.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::AiWeights;
use crate::data::CharacterClass;
use crate::grid::GridCoord;

/// Stable identifier of a unit within one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which roster a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Human-controlled squad.
    Player,
    /// AI-controlled squad.
    Enemy,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Outcome of applying damage to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    /// Hit points actually removed.
    pub dealt: u32,
    /// Whether this damage killed the unit.
    pub killed: bool,
}

/// A squad member on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Owning roster.
    pub side: Side,
    /// Stat template.
    pub class: Arc<CharacterClass>,
    /// Current hit points (0 means dead).
    pub hp: u32,
    /// Action points left this turn.
    pub ap: u32,
    /// Rounds left in the magazine.
    pub ammo: u32,
    /// Tile the unit stands on.
    pub grid_pos: GridCoord,
    /// Whether the unit is watching for movement.
    pub is_overwatch: bool,
    /// Whether the overwatch shot has already been taken.
    pub overwatch_used_this_round: bool,
    /// Decision weights used when the unit is AI-driven.
    pub ai_weights: Option<AiWeights>,
}

impl Unit {
    /// Spawn a unit at full hit points, AP and ammo.
    #[must_use]
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        side: Side,
        class: Arc<CharacterClass>,
        grid_pos: GridCoord,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            hp: class.max_hp,
            ap: class.max_ap,
            ammo: class.max_ammo,
            class,
            grid_pos,
            is_overwatch: false,
            overwatch_used_this_round: false,
            ai_weights: None,
        }
    }

    /// Builder method to attach AI weights.
    #[must_use]
    pub fn with_weights(mut self, weights: AiWeights) -> Self {
        self.ai_weights = Some(weights);
        self
    }

    /// Check if the unit has been killed.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Check if the unit is still in play.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Whether this unit could take a reactive shot right now.
    #[must_use]
    pub const fn overwatch_ready(&self) -> bool {
        self.is_alive() && self.is_overwatch && !self.overwatch_used_this_round
    }

    /// Refill AP at the start of the unit's turn.
    pub fn begin_turn(&mut self) {
        self.ap = self.class.max_ap;
    }

    /// Spend `cost` AP. Fails without change when AP is short.
    pub fn spend_ap(&mut self, cost: u32) -> bool {
        if self.ap < cost {
            return false;
        }
        self.ap -= cost;
        true
    }

    /// Refill the magazine for `cost` AP.
    pub fn reload(&mut self, cost: u32) -> bool {
        if self.is_dead() || !self.spend_ap(cost) {
            return false;
        }
        self.ammo = self.class.max_ammo;
        true
    }

    /// Enter overwatch for `cost` AP.
    ///
    /// The stance is only set once the AP has actually been paid.
    pub fn enter_overwatch(&mut self, cost: u32) -> bool {
        if self.is_dead() || !self.spend_ap(cost) {
            return false;
        }
        self.is_overwatch = true;
        self.overwatch_used_this_round = false;
        true
    }

    /// Leave overwatch.
    pub fn clear_overwatch(&mut self) {
        self.is_overwatch = false;
        self.overwatch_used_this_round = false;
    }

    /// Apply `amount` damage, clamping at zero hit points.
    ///
    /// A unit that reaches zero drops its overwatch stance. Damage to a dead
    /// unit is ignored.
    pub fn take_damage(&mut self, amount: u32) -> DamageResult {
        if self.is_dead() {
            return DamageResult {
                dealt: 0,
                killed: false,
            };
        }

        let dealt = amount.min(self.hp);
        self.hp -= dealt;

        let killed = self.is_dead();
        if killed {
            self.clear_overwatch();
        }
        DamageResult { dealt, killed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rifleman() -> Unit {
        Unit::new(
            UnitId(1),
            "Rifleman",
            Side::Player,
            Arc::new(CharacterClass::default()),
            GridCoord::new(0, 0),
        )
    }

    #[test]
    fn test_spawn_from_class() {
        let unit = rifleman();
        assert_eq!((unit.hp, unit.ap, unit.ammo), (10, 2, 6));
        assert!(unit.is_alive());
        assert!(!unit.is_overwatch);
    }

    #[test]
    fn test_spend_ap() {
        let mut unit = rifleman();
        assert!(unit.spend_ap(1));
        assert_eq!(unit.ap, 1);
        assert!(!unit.spend_ap(2));
        assert_eq!(unit.ap, 1);
        assert!(unit.spend_ap(1));
        assert_eq!(unit.ap, 0);
        unit.begin_turn();
        assert_eq!(unit.ap, 2);
    }

    #[test]
    fn test_reload() {
        let mut unit = rifleman();
        unit.ammo = 0;
        assert!(unit.reload(1));
        assert_eq!(unit.ammo, 6);
        assert_eq!(unit.ap, 1);

        unit.ap = 0;
        unit.ammo = 2;
        assert!(!unit.reload(1));
        assert_eq!(unit.ammo, 2);
    }

    #[test]
    fn test_enter_overwatch_requires_ap() {
        let mut unit = rifleman();
        unit.ap = 0;
        assert!(!unit.enter_overwatch(1));
        assert!(!unit.is_overwatch);

        unit.ap = 2;
        unit.overwatch_used_this_round = true;
        assert!(unit.enter_overwatch(1));
        assert!(unit.is_overwatch);
        assert!(!unit.overwatch_used_this_round);
        assert_eq!(unit.ap, 1);
        assert!(unit.overwatch_ready());
    }

    #[test]
    fn test_take_damage_clamps_and_kills() {
        let mut unit = rifleman();
        unit.is_overwatch = true;

        let first = unit.take_damage(4);
        assert_eq!(first, DamageResult { dealt: 4, killed: false });
        assert_eq!(unit.hp, 6);
        assert!(unit.is_overwatch);

        let second = unit.take_damage(50);
        assert_eq!(second, DamageResult { dealt: 6, killed: true });
        assert_eq!(unit.hp, 0);
        assert!(unit.is_dead());
        assert!(!unit.is_overwatch);

        let third = unit.take_damage(3);
        assert_eq!(third, DamageResult { dealt: 0, killed: false });
    }

    #[test]
    fn test_dead_unit_cannot_act() {
        let mut unit = rifleman();
        unit.take_damage(100);
        assert!(!unit.reload(0));
        assert!(!unit.enter_overwatch(0));
    }

    #[derive(Debug, Clone)]
    enum ApOp {
        BeginTurn,
        Spend(u32),
    }

    fn arb_ap_op() -> impl Strategy<Value = ApOp> {
        prop_oneof![Just(ApOp::BeginTurn), (0u32..5).prop_map(ApOp::Spend)]
    }

    proptest! {
        #[test]
        fn prop_ap_stays_within_bounds(ops in proptest::collection::vec(arb_ap_op(), 0..64)) {
            let mut unit = rifleman();
            let max = unit.class.max_ap;
            for op in ops {
                match op {
                    ApOp::BeginTurn => unit.begin_turn(),
                    ApOp::Spend(cost) => {
                        let before = unit.ap;
                        let ok = unit.spend_ap(cost);
                        prop_assert_eq!(ok, before >= cost);
                    }
                }
                prop_assert!(unit.ap <= max);
            }
        }
    }
}
