//! Grid pathfinding using breadth-first search.
//!
//! Every step between cardinal neighbours costs the same, so BFS yields
//! shortest paths by step count. Neighbours are expanded in the fixed order
//! reported by [`GridMap::neighbors`], which makes ties resolve the same way
//! on every run.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::grid::{GridCoord, GridMap};

/// Find a shortest path from `start` to `goal`.
///
/// Returns the tiles walked, `start` first and `goal` last, or `None` if
/// `goal` is off the map, not walkable, or unreachable. A path to the start
/// tile itself is the single-element path.
///
/// Occupancy is ignored: callers re-check each tile while walking the path.
#[must_use]
pub fn find_path(grid: &GridMap, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
    grid.tile_at(start)?;
    let goal_tile = grid.tile_at(goal)?;

    if start == goal {
        return Some(vec![start]);
    }
    if !goal_tile.walkable {
        return None;
    }

    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut visited: HashSet<GridCoord> = HashSet::from([start]);
    let mut queue: VecDeque<GridCoord> = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            break;
        }

        for next in grid.neighbors(current) {
            if visited.insert(next) {
                came_from.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    if !came_from.contains_key(&goal) {
        return None;
    }

    Some(reconstruct_path(&came_from, start, goal))
}

/// Walk predecessors back from `goal` and reverse.
fn reconstruct_path(
    came_from: &HashMap<GridCoord, GridCoord>,
    start: GridCoord,
    goal: GridCoord,
) -> Vec<GridCoord> {
    let mut path = vec![goal];
    let mut current = goal;

    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }

    path.reverse();
    path
}

/// All tiles within `max_steps` steps of `start`, in discovery order.
///
/// The start tile is included. Walkability is respected through
/// [`GridMap::neighbors`]; occupancy is not, so callers filter occupied tiles
/// themselves when choosing destinations.
#[must_use]
pub fn reachable(grid: &GridMap, start: GridCoord, max_steps: u32) -> Vec<GridCoord> {
    bounded_search(grid, start, max_steps, false)
        .into_iter()
        .map(|(coord, _)| coord)
        .collect()
}

/// Tiles a unit at `start` could walk to this move, for range overlays.
///
/// Unlike [`reachable`], the search does not pass through occupied tiles and
/// the start tile itself is left out.
#[must_use]
pub fn movement_range(grid: &GridMap, start: GridCoord, max_steps: u32) -> Vec<GridCoord> {
    bounded_search(grid, start, max_steps, true)
        .into_iter()
        .skip(1)
        .map(|(coord, _)| coord)
        .collect()
}

/// BFS distances from `start` for every tile within `max_steps`.
#[must_use]
pub fn step_distances(grid: &GridMap, start: GridCoord, max_steps: u32) -> HashMap<GridCoord, u32> {
    bounded_search(grid, start, max_steps, false)
        .into_iter()
        .collect()
}

fn bounded_search(
    grid: &GridMap,
    start: GridCoord,
    max_steps: u32,
    avoid_occupied: bool,
) -> Vec<(GridCoord, u32)> {
    if grid.tile_at(start).is_none() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut visited: HashSet<GridCoord> = HashSet::from([start]);
    let mut queue: VecDeque<(GridCoord, u32)> = VecDeque::from([(start, 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        found.push((current, depth));
        if depth >= max_steps {
            continue;
        }

        for next in grid.neighbors(current) {
            if avoid_occupied && grid.is_occupied(next) {
                continue;
            }
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    found
}

/// Cut a path down to at most `budget` steps.
///
/// Keeps the first `min(budget, len - 1) + 1` tiles, so the start tile is
/// always retained.
#[must_use]
pub fn truncate_path(path: &[GridCoord], budget: u32) -> Vec<GridCoord> {
    if path.is_empty() {
        return Vec::new();
    }
    let steps = (budget as usize).min(path.len() - 1);
    path[..=steps].to_vec()
}
