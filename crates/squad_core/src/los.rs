//! Line-of-fire oracles.
//!
//! The combat resolver never raycasts itself. It asks a [`LineOfFire`]
//! implementation whether the segment between two world points crosses a
//! solid obstacle, and which cover it passes through. Engines plug their
//! physics queries in here; [`GridLineOfFire`] answers from the tile map for
//! headless play and tests.

use std::collections::HashSet;

use crate::grid::{CoverLevel, GridCoord, GridMap};
use crate::math::Vec2Fixed;

/// Obstruction queries along a straight segment between two world points.
pub trait LineOfFire: Send {
    /// Whether a solid obstacle lies on the segment.
    fn segment_blocked(&self, grid: &GridMap, from: Vec2Fixed, to: Vec2Fixed) -> bool;

    /// Strongest cover crossed strictly between the endpoints.
    fn cover_crossed(&self, grid: &GridMap, from: Vec2Fixed, to: Vec2Fixed) -> CoverLevel;
}

/// An oracle for maps without obstructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl LineOfFire for OpenField {
    fn segment_blocked(&self, _grid: &GridMap, _from: Vec2Fixed, _to: Vec2Fixed) -> bool {
        false
    }

    fn cover_crossed(&self, _grid: &GridMap, _from: Vec2Fixed, _to: Vec2Fixed) -> CoverLevel {
        CoverLevel::None
    }
}

/// Tile-based oracle: walks the cells under the segment.
///
/// Cells listed as obstacles block the shot. Otherwise the cover of every
/// cell strictly between the shooter's and the target's tile counts, and the
/// strongest one wins.
#[derive(Debug, Clone, Default)]
pub struct GridLineOfFire {
    obstacles: HashSet<GridCoord>,
}

impl GridLineOfFire {
    /// Create an oracle from the obstacle cells of a map.
    #[must_use]
    pub fn new(obstacles: impl IntoIterator<Item = GridCoord>) -> Self {
        Self {
            obstacles: obstacles.into_iter().collect(),
        }
    }

    /// Check if `coord` holds a solid obstacle.
    #[must_use]
    pub fn is_obstacle(&self, coord: GridCoord) -> bool {
        self.obstacles.contains(&coord)
    }

    fn interior(grid: &GridMap, from: Vec2Fixed, to: Vec2Fixed) -> Vec<GridCoord> {
        let cells = cells_on_segment(grid.world_to_grid(from), grid.world_to_grid(to));
        if cells.len() <= 2 {
            return Vec::new();
        }
        cells[1..cells.len() - 1].to_vec()
    }
}

impl LineOfFire for GridLineOfFire {
    fn segment_blocked(&self, grid: &GridMap, from: Vec2Fixed, to: Vec2Fixed) -> bool {
        Self::interior(grid, from, to)
            .into_iter()
            .any(|cell| self.is_obstacle(cell))
    }

    fn cover_crossed(&self, grid: &GridMap, from: Vec2Fixed, to: Vec2Fixed) -> CoverLevel {
        Self::interior(grid, from, to)
            .into_iter()
            .map(|cell| grid.cover_at(cell))
            .max()
            .unwrap_or(CoverLevel::None)
    }
}

/// Cells visited by Bresenham's line from `a` to `b`, both ends included.
#[must_use]
pub fn cells_on_segment(a: GridCoord, b: GridCoord) -> Vec<GridCoord> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx - dy;

    let mut x = a.x;
    let mut y = a.y;
    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);

    loop {
        cells.push(GridCoord::new(x, y));
        if x == b.x && y == b.y {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    fn c(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    fn world(grid: &GridMap, x: i32, y: i32) -> Vec2Fixed {
        grid.grid_to_world(c(x, y))
    }

    #[test]
    fn test_segment_cells() {
        assert_eq!(
            cells_on_segment(c(0, 0), c(3, 0)),
            vec![c(0, 0), c(1, 0), c(2, 0), c(3, 0)]
        );
        assert_eq!(cells_on_segment(c(2, 2), c(2, 2)), vec![c(2, 2)]);

        let diagonal = cells_on_segment(c(0, 0), c(3, 3));
        assert_eq!(diagonal, vec![c(0, 0), c(1, 1), c(2, 2), c(3, 3)]);

        let reversed = cells_on_segment(c(4, 1), c(0, 0));
        assert_eq!(reversed.first(), Some(&c(4, 1)));
        assert_eq!(reversed.last(), Some(&c(0, 0)));
    }

    #[test]
    fn test_open_field() {
        let grid = GridMap::new(5, 5, Fixed::ONE);
        let los = OpenField;
        assert!(!los.segment_blocked(&grid, world(&grid, 0, 0), world(&grid, 4, 4)));
        assert_eq!(
            los.cover_crossed(&grid, world(&grid, 0, 0), world(&grid, 4, 4)),
            CoverLevel::None
        );
    }

    #[test]
    fn test_obstacle_blocks_only_when_between() {
        let layout = GridMap::from_layout(&[".#..."], Fixed::ONE).unwrap();
        let grid = &layout.grid;
        let los = GridLineOfFire::new(layout.obstacles);

        assert!(los.segment_blocked(grid, world(grid, 0, 0), world(grid, 4, 0)));
        assert!(!los.segment_blocked(grid, world(grid, 2, 0), world(grid, 4, 0)));
    }

    #[test]
    fn test_strongest_cover_wins_and_endpoints_ignored() {
        let layout = GridMap::from_layout(&["fh.H.f"], Fixed::ONE).unwrap();
        let grid = &layout.grid;
        let los = GridLineOfFire::new(layout.obstacles);

        // Interior cells (1..=4): half, none, half. Endpoints have full cover.
        assert_eq!(
            los.cover_crossed(grid, world(grid, 0, 0), world(grid, 5, 0)),
            CoverLevel::Half
        );

        let layout = GridMap::from_layout(&[".hF.."], Fixed::ONE).unwrap();
        let grid = &layout.grid;
        let los = GridLineOfFire::new(layout.obstacles);
        assert_eq!(
            los.cover_crossed(grid, world(grid, 0, 0), world(grid, 4, 0)),
            CoverLevel::Full
        );
        // Adjacent units: nothing lies between them.
        assert_eq!(
            los.cover_crossed(grid, world(grid, 1, 0), world(grid, 2, 0)),
            CoverLevel::None
        );
    }
}
