//! Stateless decision helpers for AI-driven units.
//!
//! Everything here is a pure function of the map, the units and the dice.
//! The activation loop that strings these together lives with the
//! simulation context, since it has to move units and trigger reactions.

use crate::dice::Dice;
use crate::grid::{GridCoord, GridMap};
use crate::pathfinding::{find_path, reachable, truncate_path};
use crate::unit::Unit;

use super::weights::AiWeights;

/// One action picked by the weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyAction {
    /// Fire at the nearest opponent.
    Shoot,
    /// Close in on the nearest opponent.
    Move,
    /// Relocate to the best covered tile.
    Cover,
    /// Enter overwatch.
    Overwatch,
}

/// Draw an action from `weights`.
///
/// Shoot only takes part when `can_shoot` holds. The roll is cumulative over
/// `1..=total` in the order shoot, move, cover, overwatch. With a zero total
/// the unit shoots if it can and moves otherwise.
pub fn choose_action(weights: &AiWeights, can_shoot: bool, dice: &mut dyn Dice) -> EnemyAction {
    let shoot = if can_shoot { weights.shoot.max(0) } else { 0 };
    let movement = weights.movement.max(0);
    let cover = weights.cover.max(0);
    let overwatch = weights.overwatch.max(0);

    let total = shoot + movement + cover + overwatch;
    if total <= 0 {
        return if can_shoot {
            EnemyAction::Shoot
        } else {
            EnemyAction::Move
        };
    }

    let mut roll = dice.roll(1, total);
    if roll <= shoot {
        return EnemyAction::Shoot;
    }
    roll -= shoot;
    if roll <= movement {
        return EnemyAction::Move;
    }
    roll -= movement;
    if roll <= cover {
        return EnemyAction::Cover;
    }
    EnemyAction::Overwatch
}

/// Closest living unit among `candidates` by Manhattan distance.
///
/// The first candidate wins ties.
pub fn nearest_opponent<'a>(
    from: GridCoord,
    candidates: impl IntoIterator<Item = &'a Unit>,
) -> Option<&'a Unit> {
    let mut best: Option<(&Unit, u32)> = None;
    for candidate in candidates {
        if candidate.is_dead() {
            continue;
        }
        let distance = from.manhattan(candidate.grid_pos);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(unit, _)| unit)
}

/// Free tiles within `range` steps of `start`, in BFS discovery order.
fn free_reachable(grid: &GridMap, start: GridCoord, range: u32) -> impl Iterator<Item = GridCoord> + '_ {
    reachable(grid, start, range)
        .into_iter()
        .filter(move |&c| grid.is_walkable(c) && !grid.is_occupied(c))
}

/// Reachable free tile closest to `target`. The first discovered wins ties.
#[must_use]
pub fn best_approach_tile(
    grid: &GridMap,
    start: GridCoord,
    target: GridCoord,
    range: u32,
) -> Option<GridCoord> {
    let mut best: Option<(GridCoord, u32)> = None;
    for tile in free_reachable(grid, start, range) {
        let distance = tile.manhattan(target);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((tile, distance));
        }
    }
    best.map(|(tile, _)| tile)
}

/// Reachable free tile maximising `cover_score * 100 - distance`.
///
/// Returns `None` when the winner offers no cover at all, so callers fall
/// back to a plain approach.
#[must_use]
pub fn best_cover_tile(
    grid: &GridMap,
    start: GridCoord,
    target: GridCoord,
    range: u32,
) -> Option<GridCoord> {
    let mut best: Option<(GridCoord, i64)> = None;
    for tile in free_reachable(grid, start, range) {
        let cover = i64::from(grid.cover_at(tile).ai_score());
        let score = cover * 100 - i64::from(tile.manhattan(target));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((tile, score));
        }
    }

    best.map(|(tile, _)| tile)
        .filter(|&tile| grid.cover_at(tile).ai_score() > 0)
}

/// Pick a random destination near `start` and return the path to it.
///
/// Each attempt draws an offset in `-range..=range` on both axes and keeps
/// the first free, reachable tile. The path is already cut to `range` steps.
pub fn random_walk(
    grid: &GridMap,
    start: GridCoord,
    range: u32,
    attempts: u32,
    dice: &mut dyn Dice,
) -> Option<Vec<GridCoord>> {
    let spread = i32::try_from(range).unwrap_or(i32::MAX);
    for _ in 0..attempts {
        let dx = dice.roll(-spread, spread);
        let dy = dice.roll(-spread, spread);
        let candidate = start.offset(dx, dy);

        match grid.tile_at(candidate) {
            Some(tile) if tile.walkable && !tile.is_occupied() => {}
            _ => continue,
        }

        let Some(path) = find_path(grid, start, candidate) else {
            continue;
        };
        if path.len() <= 1 {
            continue;
        }
        return Some(truncate_path(&path, range));
    }
    None
}
