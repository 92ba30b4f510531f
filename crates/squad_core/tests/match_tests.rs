//! Match-level tests driving `TacticsSim` through its public commands.
//!
//! Dice are scripted so every hit, miss and AI draw is exact.

use squad_core::ai::AiWeights;
use squad_core::combat::{ShotKind, ShotRejection};
use squad_core::data::CharacterClass;
use squad_core::events::MatchEvent;
use squad_core::grid::CoverLevel;
use squad_core::simulation::{MoveRejection, UnitSpawn};
use squad_core::turn::{MatchResult, TurnState};
use squad_core::unit::{Side, UnitId};
use squad_test_utils::dice::ScriptedDice;
use squad_test_utils::fixtures::{coord, registry, sentry, soldier, MatchBuilder};

const ALPHA: UnitId = UnitId(0);
const GRUNT: UnitId = UnitId(1);

// =============================================================================
// Combat
// =============================================================================

#[test]
fn test_aimed_shot_hits_in_the_open() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Grunt", 5, 0))
        .begin(ScriptedDice::new([50]));

    let outcome = sim.try_fire(ALPHA, GRUNT);
    let report = outcome.report().expect("shot was fired");
    assert_eq!(report.kind, ShotKind::Aimed);
    assert_eq!(report.cover, CoverLevel::None);
    assert_eq!(report.hit_chance, 70);
    assert_eq!(report.roll, 50);
    assert!(report.hit);
    assert_eq!(report.damage, 3);

    let alpha = sim.unit(ALPHA).unwrap();
    assert_eq!(alpha.ammo, 5);
    assert_eq!(alpha.ap, 1);
    assert_eq!(sim.unit(GRUNT).unwrap().hp, 7);
}

#[test]
fn test_full_cover_turns_a_hit_into_a_miss() {
    let mut sim = MatchBuilder::new()
        .layout(&["..F.."])
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Grunt", 4, 0))
        .begin(ScriptedDice::new([21]));

    let outcome = sim.try_fire(ALPHA, GRUNT);
    let report = outcome.report().expect("shot was fired");
    assert_eq!(report.cover, CoverLevel::Full);
    assert_eq!(report.hit_chance, 20);
    assert!(!report.hit);
    assert_eq!(report.damage, 0);
    assert_eq!(report.impact, sim.grid().grid_to_world(coord(4, 0)));

    // A miss still costs the round and the AP.
    let alpha = sim.unit(ALPHA).unwrap();
    assert_eq!(alpha.ammo, 5);
    assert_eq!(alpha.ap, 1);
    assert_eq!(sim.unit(GRUNT).unwrap().hp, 10);
}

#[test]
fn test_obstacle_blocks_the_shot_without_cost() {
    let mut sim = MatchBuilder::new()
        .layout(&["..#.."])
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Grunt", 4, 0))
        .begin(ScriptedDice::always_low());

    let outcome = sim.try_fire(ALPHA, GRUNT);
    assert_eq!(outcome.rejection(), Some(ShotRejection::Blocked));
    let alpha = sim.unit(ALPHA).unwrap();
    assert_eq!(alpha.ammo, 6);
    assert_eq!(alpha.ap, 2);
}

#[test]
fn test_empty_magazine_then_reload() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Grunt", 3, 0))
        .begin(ScriptedDice::always_high());

    assert!(sim.try_fire(ALPHA, GRUNT).is_fired());
    assert!(sim.try_fire(ALPHA, GRUNT).is_fired());
    // Out of AP now, so nothing else goes through this turn.
    assert_eq!(
        sim.try_fire(ALPHA, GRUNT).rejection(),
        Some(ShotRejection::InsufficientAp)
    );
    assert!(!sim.try_reload(ALPHA));
    assert_eq!(sim.unit(ALPHA).unwrap().ammo, 4);
}

#[test]
fn test_commands_refused_for_inactive_unit() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .player(soldier("Bravo", 1, 0))
        .enemy(sentry("Grunt", 11, 11))
        .begin(ScriptedDice::always_low());

    // Bravo is UnitId(1) and has not been activated yet.
    let bravo = UnitId(1);
    assert_eq!(
        sim.try_move_unit(bravo, coord(1, 3)).rejection(),
        Some(MoveRejection::NotActiveUnit)
    );
    assert_eq!(
        sim.try_fire(bravo, UnitId(2)).rejection(),
        Some(ShotRejection::NotActiveUnit)
    );
}

// =============================================================================
// Movement and overwatch
// =============================================================================

#[test]
fn test_move_is_cut_to_move_range_and_paid_once() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Grunt", 11, 11))
        .begin(ScriptedDice::always_low());

    let outcome = sim.try_move_unit(ALPHA, coord(10, 0));
    let report = outcome.report().expect("unit moved");
    assert_eq!(report.path.len(), 7);
    assert!(report.completed);
    assert!(!report.killed);

    let alpha = sim.unit(ALPHA).unwrap();
    assert_eq!(alpha.grid_pos, coord(6, 0));
    assert_eq!(alpha.ap, 1);
    assert!(sim.grid().is_occupied(coord(6, 0)));
    assert!(!sim.grid().is_occupied(coord(0, 0)));
}

#[test]
fn test_move_stops_at_a_squadmate_on_the_route() {
    let bravo = UnitId(1);
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .player(soldier("Bravo", 3, 0))
        .enemy(sentry("Grunt", 11, 11))
        .begin(ScriptedDice::always_low());
    sim.drain_events();

    let outcome = sim.try_move_unit(ALPHA, coord(5, 0));
    let report = outcome.report().expect("move was paid for");
    assert_eq!(report.path, vec![coord(0, 0), coord(1, 0), coord(2, 0)]);
    assert!(!report.completed);

    let alpha = sim.unit(ALPHA).unwrap();
    assert_eq!(alpha.grid_pos, coord(2, 0));
    assert_eq!(alpha.ap, 1);
    assert_eq!(sim.unit(bravo).unwrap().grid_pos, coord(3, 0));

    let last_step = sim
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            MatchEvent::UnitStepped { to, .. } => Some(to),
            _ => None,
        })
        .last();
    assert_eq!(last_step, Some(coord(2, 0)));
}

#[test]
fn test_overwatch_fires_exactly_once_per_move() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Watcher", 5, 5))
        .begin(ScriptedDice::always_high());

    // Round 1: the watcher's activation puts it on overwatch.
    assert!(sim.end_current_unit_turn());
    assert!(sim.unit(GRUNT).unwrap().is_overwatch);
    assert_eq!(sim.round(), 2);
    sim.drain_events();

    // Every tile from (2, 0) on is inside overwatch range.
    let outcome = sim.try_move_unit(ALPHA, coord(6, 0));
    assert!(outcome.is_moved());

    let events = sim.drain_events();
    let reactive: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            MatchEvent::ShotFired(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(reactive.len(), 1);
    assert_eq!(reactive[0].kind, ShotKind::Reactive);
    assert_eq!(reactive[0].attacker, GRUNT);

    let watcher = sim.unit(GRUNT).unwrap();
    assert!(watcher.overwatch_used_this_round);
    assert!(watcher.is_overwatch);
    assert_eq!(watcher.ammo, 5);
    assert_eq!(sim.unit(ALPHA).unwrap().grid_pos, coord(6, 0));
}

#[test]
fn test_overwatch_cleared_at_own_next_turn() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(sentry("Watcher", 11, 11))
        .begin(ScriptedDice::always_high());

    sim.end_current_unit_turn();
    sim.drain_events();
    sim.end_current_unit_turn();

    let events = sim.drain_events();
    let cleared = events
        .iter()
        .position(|e| *e == MatchEvent::OverwatchCleared { unit: GRUNT });
    let entered = events
        .iter()
        .position(|e| *e == MatchEvent::OverwatchEntered { unit: GRUNT });
    assert!(cleared.is_some());
    assert!(cleared < entered);
}

// =============================================================================
// Match flow
// =============================================================================

#[test]
fn test_killing_the_last_enemy_ends_the_match_at_once() {
    let mut fragile = CharacterClass::default();
    fragile.max_hp = 3;
    let mut sim = MatchBuilder::new()
        .classes(registry([("fragile", fragile)]))
        .player(soldier("Alpha", 0, 0))
        .enemy(UnitSpawn::new("Grunt", "fragile", coord(3, 0)))
        .begin(ScriptedDice::new([1]));
    sim.drain_events();

    let outcome = sim.try_fire(ALPHA, GRUNT);
    assert!(outcome.report().unwrap().target_killed);
    assert_eq!(sim.state(), TurnState::GameOver(MatchResult::Victory));
    assert_eq!(sim.result(), Some(MatchResult::Victory));

    let events = sim.drain_events();
    assert!(events.contains(&MatchEvent::UnitDied { unit: GRUNT }));
    assert_eq!(
        events.last(),
        Some(&MatchEvent::MatchEnded {
            result: MatchResult::Victory
        })
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, MatchEvent::TurnStarted { .. })));

    // Nothing moves once the match is over.
    assert!(!sim.end_current_unit_turn());
    assert!(sim.try_move_unit(ALPHA, coord(1, 0)).rejection().is_some());
}

#[test]
fn test_turns_interleave_player_then_enemy() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .player(soldier("Bravo", 1, 0))
        .enemy(sentry("Grunt", 11, 11))
        .begin(ScriptedDice::always_high());

    let started: Vec<(UnitId, Side, u32)> = {
        sim.end_current_unit_turn();
        sim.end_current_unit_turn();
        sim.drain_events()
            .into_iter()
            .filter_map(|e| match e {
                MatchEvent::TurnStarted { unit, side, round } => Some((unit, side, round)),
                _ => None,
            })
            .collect()
    };

    // Alpha, Grunt (autopilot), Bravo, then round 2 opens with Alpha.
    assert_eq!(
        started,
        vec![
            (ALPHA, Side::Player, 1),
            (UnitId(2), Side::Enemy, 1),
            (UnitId(1), Side::Player, 1),
            (ALPHA, Side::Player, 2),
        ]
    );
}

#[test]
fn test_unknown_class_spawns_nothing_playable() {
    let mut sim = MatchBuilder::new()
        .player(soldier("Alpha", 0, 0))
        .enemy(UnitSpawn::new("Ghost", "plasma", coord(5, 5)))
        .enemy(sentry("Grunt", 11, 11))
        .begin(ScriptedDice::always_high());

    assert!(sim.unit(UnitId(1)).is_none());
    assert!(!sim.grid().is_occupied(coord(5, 5)));
    assert_eq!(sim.roster(Side::Enemy), &[UnitId(2)]);
    assert!(sim.end_current_unit_turn());
    assert!(sim.result().is_none());
}

#[test]
fn test_invalid_spawn_is_rejected_atomically() {
    let mut sim = squad_core::simulation::TacticsSim::new(
        squad_test_utils::fixtures::open_grid(4),
        registry([]),
        squad_core::data::RulesConfig::default(),
        Box::new(squad_core::los::OpenField),
        Box::new(ScriptedDice::always_low()),
    );

    let result = sim.begin_match(vec![soldier("Alpha", 0, 0)], vec![soldier("Grunt", 0, 0)]);
    assert!(result.is_err());
    assert_eq!(sim.units().count(), 0);
    assert!(!sim.grid().is_occupied(coord(0, 0)));
}

#[test]
fn test_normalised_weights_sum_to_ten() {
    let weights = AiWeights::new(10, 10, 10, 10);
    assert_eq!(weights.total(), 10);
    assert!(weights.shoot >= 0 && weights.movement >= 0);
    assert!(weights.cover >= 0 && weights.overwatch >= 0);
}
