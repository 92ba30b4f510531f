//! Shot resolution.
//!
//! One function, [`resolve_shot`], covers both aimed fire on the active
//! unit's turn and reactive overwatch fire during an opponent's move. The
//! resolver validates the attempt, asks the line-of-fire oracle for
//! obstruction and cover, spends resources, rolls the dice and applies
//! damage. A rejected attempt never changes either unit.

use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::grid::{CoverLevel, GridMap};
use crate::los::LineOfFire;
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::{Unit, UnitId};

/// Lowest hit chance any shot can have, in percent.
pub const MIN_HIT_CHANCE: i32 = 5;

/// Highest hit chance any shot can have, in percent.
pub const MAX_HIT_CHANCE: i32 = 95;

/// Chance to hit after cover, clamped to [`MIN_HIT_CHANCE`]..=[`MAX_HIT_CHANCE`].
#[must_use]
pub fn hit_chance(aim: u32, cover: CoverLevel) -> i32 {
    let aim = i32::try_from(aim).unwrap_or(i32::MAX);
    aim.saturating_sub(cover.hit_penalty())
        .clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
}

/// How a shot was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotKind {
    /// Deliberate shot by the active unit.
    Aimed,
    /// Overwatch reaction to an opponent's movement.
    Reactive,
}

/// Parameters of one shot attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotRequest {
    /// Aimed or reactive.
    pub kind: ShotKind,
    /// AP the attacker pays.
    pub ap_cost: u32,
    /// Maximum Manhattan distance to the target.
    pub max_range: u32,
}

impl ShotRequest {
    /// An aimed shot.
    #[must_use]
    pub const fn aimed(ap_cost: u32, max_range: u32) -> Self {
        Self {
            kind: ShotKind::Aimed,
            ap_cost,
            max_range,
        }
    }

    /// A reactive shot. Costs no AP.
    #[must_use]
    pub const fn reactive(max_range: u32) -> Self {
        Self {
            kind: ShotKind::Reactive,
            ap_cost: 0,
            max_range,
        }
    }
}

/// Why a shot attempt did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotRejection {
    /// The attacker is dead.
    AttackerDead,
    /// The target is already dead.
    TargetDead,
    /// A unit tried to shoot itself.
    SameUnit,
    /// Not enough AP for the shot.
    InsufficientAp,
    /// The magazine is empty.
    OutOfAmmo,
    /// Target beyond the range limit.
    OutOfRange,
    /// Reactive shot from a unit that is not ready on overwatch.
    NotOnOverwatch,
    /// A solid obstacle lies between the units.
    Blocked,
    /// A unit id did not resolve to a unit in play.
    UnknownUnit,
    /// The attacker is not the active unit, or the match is not running.
    NotActiveUnit,
}

/// Everything that happened during a fired shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotReport {
    /// Shooting unit.
    pub attacker: UnitId,
    /// Unit shot at.
    pub target: UnitId,
    /// Aimed or reactive.
    pub kind: ShotKind,
    /// Strongest cover between the units.
    pub cover: CoverLevel,
    /// Chance to hit in percent.
    pub hit_chance: i32,
    /// Percentile roll.
    pub roll: i32,
    /// Whether the shot hit.
    pub hit: bool,
    /// Hit points removed from the target.
    pub damage: u32,
    /// Whether the target died from this shot.
    pub target_killed: bool,
    /// Where the round landed, in world units. Misses scatter around the target.
    pub impact: Vec2Fixed,
}

/// Result of a shot attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Nothing was consumed.
    Rejected(ShotRejection),
    /// The shot was taken.
    Fired(ShotReport),
}

impl ShotOutcome {
    /// Check if the shot was actually taken.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }

    /// Check if the shot was taken and hit.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Fired(report) if report.hit)
    }

    /// The report of a fired shot.
    #[must_use]
    pub const fn report(&self) -> Option<&ShotReport> {
        match self {
            Self::Fired(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason of a refused shot.
    #[must_use]
    pub const fn rejection(&self) -> Option<ShotRejection> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            Self::Fired(_) => None,
        }
    }
}

/// Shared inputs of shot resolution.
#[derive(Clone, Copy)]
pub struct FireContext<'a> {
    /// The map both units stand on.
    pub grid: &'a GridMap,
    /// Obstruction and cover oracle.
    pub line_of_fire: &'a dyn LineOfFire,
    /// Scatter radius of missed shots, in world units.
    pub miss_offset_radius: Fixed,
}

/// Validate and resolve one shot from `attacker` at `target`.
///
/// Checks run in order: liveness, self-targeting, overwatch readiness for
/// reactive shots, AP, ammo, range, and finally obstruction. Only a shot
/// that passes all of them spends AP and ammo and rolls the dice.
pub fn resolve_shot(
    attacker: &mut Unit,
    target: &mut Unit,
    request: &ShotRequest,
    ctx: &FireContext<'_>,
    dice: &mut dyn Dice,
) -> ShotOutcome {
    if let Some(reason) = precheck(attacker, target, request) {
        tracing::debug!(
            attacker = %attacker.id,
            target = %target.id,
            ?reason,
            "Shot rejected"
        );
        return ShotOutcome::Rejected(reason);
    }

    let from = ctx.grid.grid_to_world(attacker.grid_pos);
    let to = ctx.grid.grid_to_world(target.grid_pos);
    if ctx.line_of_fire.segment_blocked(ctx.grid, from, to) {
        tracing::debug!(attacker = %attacker.id, target = %target.id, "Line of fire blocked");
        return ShotOutcome::Rejected(ShotRejection::Blocked);
    }

    let cover = ctx.line_of_fire.cover_crossed(ctx.grid, from, to);
    let chance = hit_chance(attacker.class.aim, cover);

    // Validated above, so neither can fail.
    attacker.spend_ap(request.ap_cost);
    attacker.ammo -= 1;
    if request.kind == ShotKind::Reactive {
        attacker.overwatch_used_this_round = true;
    }

    let roll = dice.roll_percent();
    let hit = roll <= chance;

    let (damage, target_killed, impact) = if hit {
        let result = target.take_damage(attacker.class.damage);
        (result.dealt, result.killed, to)
    } else {
        (0, false, to + dice.scatter(ctx.miss_offset_radius))
    };

    tracing::debug!(
        attacker = %attacker.id,
        target = %target.id,
        kind = ?request.kind,
        ?cover,
        chance,
        roll,
        hit,
        damage,
        "Shot resolved"
    );

    ShotOutcome::Fired(ShotReport {
        attacker: attacker.id,
        target: target.id,
        kind: request.kind,
        cover,
        hit_chance: chance,
        roll,
        hit,
        damage,
        target_killed,
        impact,
    })
}

fn precheck(attacker: &Unit, target: &Unit, request: &ShotRequest) -> Option<ShotRejection> {
    if attacker.is_dead() {
        return Some(ShotRejection::AttackerDead);
    }
    if target.is_dead() {
        return Some(ShotRejection::TargetDead);
    }
    if attacker.id == target.id {
        return Some(ShotRejection::SameUnit);
    }
    if request.kind == ShotKind::Reactive && !attacker.overwatch_ready() {
        return Some(ShotRejection::NotOnOverwatch);
    }
    if attacker.ap < request.ap_cost {
        return Some(ShotRejection::InsufficientAp);
    }
    if attacker.ammo == 0 {
        return Some(ShotRejection::OutOfAmmo);
    }
    if attacker.grid_pos.manhattan(target.grid_pos) > request.max_range {
        return Some(ShotRejection::OutOfRange);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CharacterClass;
    use crate::grid::GridCoord;
    use crate::los::{GridLineOfFire, OpenField};
    use crate::unit::Side;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Dice returning queued rolls, for exact outcomes.
    struct QueuedDice {
        rolls: VecDeque<i32>,
    }

    impl Dice for QueuedDice {
        fn roll(&mut self, low: i32, _high: i32) -> i32 {
            self.rolls.pop_front().unwrap_or(low)
        }

        fn scatter(&mut self, radius: Fixed) -> Vec2Fixed {
            Vec2Fixed::new(radius, Fixed::ZERO)
        }
    }

    fn dice(rolls: &[i32]) -> QueuedDice {
        QueuedDice {
            rolls: rolls.iter().copied().collect(),
        }
    }

    fn unit(id: u32, side: Side, x: i32, y: i32) -> Unit {
        Unit::new(
            UnitId(id),
            format!("u{id}"),
            side,
            Arc::new(CharacterClass::default()),
            GridCoord::new(x, y),
        )
    }

    fn open_ctx(grid: &GridMap) -> FireContext<'_> {
        FireContext {
            grid,
            line_of_fire: &OpenField,
            miss_offset_radius: Fixed::from_num(0.6),
        }
    }

    #[test]
    fn test_hit_chance_values() {
        assert_eq!(hit_chance(70, CoverLevel::None), 70);
        assert_eq!(hit_chance(70, CoverLevel::Half), 45);
        assert_eq!(hit_chance(70, CoverLevel::Full), 20);
        assert_eq!(hit_chance(3, CoverLevel::None), MIN_HIT_CHANCE);
        assert_eq!(hit_chance(120, CoverLevel::None), MAX_HIT_CHANCE);
    }

    #[test]
    fn test_aimed_hit_consumes_and_damages() {
        let grid = GridMap::new(10, 10, Fixed::ONE);
        let mut a = unit(1, Side::Player, 0, 0);
        let mut t = unit(2, Side::Enemy, 3, 0);

        let outcome = resolve_shot(&mut a, &mut t, &ShotRequest::aimed(1, 8), &open_ctx(&grid), &mut dice(&[50]));
        let report = outcome.report().unwrap();
        assert!(report.hit);
        assert_eq!(report.hit_chance, 70);
        assert_eq!(report.damage, 3);
        assert_eq!(report.impact, grid.grid_to_world(t.grid_pos));
        assert_eq!((a.ap, a.ammo), (1, 5));
        assert_eq!(t.hp, 7);
    }

    #[test]
    fn test_miss_scatters_and_keeps_hp() {
        let grid = GridMap::new(10, 10, Fixed::ONE);
        let mut a = unit(1, Side::Player, 0, 0);
        let mut t = unit(2, Side::Enemy, 3, 0);

        let outcome = resolve_shot(&mut a, &mut t, &ShotRequest::aimed(1, 8), &open_ctx(&grid), &mut dice(&[71]));
        let report = outcome.report().unwrap();
        assert!(!report.hit);
        assert_eq!(report.damage, 0);
        assert_ne!(report.impact, grid.grid_to_world(t.grid_pos));
        assert_eq!(t.hp, 10);
        assert_eq!(a.ammo, 5);
    }

    #[test]
    fn test_full_cover_roll_21_misses() {
        let layout = GridMap::from_layout(&["..F.."], Fixed::ONE).unwrap();
        let los = GridLineOfFire::new(layout.obstacles.clone());
        let ctx = FireContext {
            grid: &layout.grid,
            line_of_fire: &los,
            miss_offset_radius: Fixed::from_num(0.6),
        };
        let mut a = unit(1, Side::Player, 0, 0);
        let mut t = unit(2, Side::Enemy, 4, 0);

        let outcome = resolve_shot(&mut a, &mut t, &ShotRequest::aimed(1, 8), &ctx, &mut dice(&[21]));
        let report = outcome.report().unwrap();
        assert_eq!(report.cover, CoverLevel::Full);
        assert_eq!(report.hit_chance, 20);
        assert!(!report.hit);
        assert_eq!(a.ammo, 5);
        assert_eq!(t.hp, 10);
    }

    #[test]
    fn test_rejections_change_nothing() {
        let grid = GridMap::new(20, 20, Fixed::ONE);
        let ctx = open_ctx(&grid);
        let request = ShotRequest::aimed(1, 8);

        let mut a = unit(1, Side::Player, 0, 0);
        let mut far = unit(2, Side::Enemy, 9, 0);
        let outcome = resolve_shot(&mut a, &mut far, &request, &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::OutOfRange));
        assert_eq!((a.ap, a.ammo), (2, 6));

        let mut near = unit(3, Side::Enemy, 1, 0);
        a.ammo = 0;
        let outcome = resolve_shot(&mut a, &mut near, &request, &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::OutOfAmmo));

        a.ammo = 6;
        a.ap = 0;
        let outcome = resolve_shot(&mut a, &mut near, &request, &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::InsufficientAp));

        a.ap = 2;
        near.take_damage(100);
        let outcome = resolve_shot(&mut a, &mut near, &request, &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::TargetDead));

        let mut twin = a.clone();
        let outcome = resolve_shot(&mut a, &mut twin, &request, &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::SameUnit));
        assert_eq!((a.ap, a.ammo), (2, 6));
    }

    #[test]
    fn test_blocked_shot_is_free() {
        let layout = GridMap::from_layout(&[".#.."], Fixed::ONE).unwrap();
        let los = GridLineOfFire::new(layout.obstacles.clone());
        let ctx = FireContext {
            grid: &layout.grid,
            line_of_fire: &los,
            miss_offset_radius: Fixed::from_num(0.6),
        };
        let mut a = unit(1, Side::Player, 0, 0);
        let mut t = unit(2, Side::Enemy, 3, 0);

        let outcome = resolve_shot(&mut a, &mut t, &ShotRequest::aimed(1, 8), &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::Blocked));
        assert_eq!((a.ap, a.ammo), (2, 6));
    }

    #[test]
    fn test_reactive_shot_rules() {
        let grid = GridMap::new(10, 10, Fixed::ONE);
        let ctx = open_ctx(&grid);
        let mut watcher = unit(1, Side::Player, 0, 0);
        let mut mover = unit(2, Side::Enemy, 2, 0);

        let outcome = resolve_shot(&mut watcher, &mut mover, &ShotRequest::reactive(8), &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::NotOnOverwatch));

        assert!(watcher.enter_overwatch(1));
        watcher.ap = 0;
        let outcome = resolve_shot(&mut watcher, &mut mover, &ShotRequest::reactive(8), &ctx, &mut dice(&[1]));
        assert!(outcome.is_hit());
        assert!(watcher.overwatch_used_this_round);
        assert_eq!(watcher.ap, 0);
        assert_eq!(watcher.ammo, 5);

        let outcome = resolve_shot(&mut watcher, &mut mover, &ShotRequest::reactive(8), &ctx, &mut dice(&[1]));
        assert_eq!(outcome.rejection(), Some(ShotRejection::NotOnOverwatch));
    }

    #[test]
    fn test_kill_clears_target_overwatch() {
        let grid = GridMap::new(10, 10, Fixed::ONE);
        let mut a = unit(1, Side::Player, 0, 0);
        let mut t = unit(2, Side::Enemy, 1, 0);
        t.hp = 2;
        assert!(t.enter_overwatch(1));

        let outcome = resolve_shot(&mut a, &mut t, &ShotRequest::aimed(1, 8), &open_ctx(&grid), &mut dice(&[1]));
        let report = outcome.report().unwrap();
        assert!(report.target_killed);
        assert_eq!(report.damage, 2);
        assert!(t.is_dead());
        assert!(!t.is_overwatch);
    }

    proptest! {
        #[test]
        fn prop_hit_chance_bounded(aim in 0u32..500, cover in prop_oneof![
            Just(CoverLevel::None), Just(CoverLevel::Half), Just(CoverLevel::Full)
        ]) {
            let chance = hit_chance(aim, cover);
            prop_assert!((MIN_HIT_CHANCE..=MAX_HIT_CHANCE).contains(&chance));
        }
    }
}
