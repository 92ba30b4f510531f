//! Tile grid for the tactical map.
//!
//! The grid owns every [`Tile`] and is the only cross-unit mutable resource in
//! a match: occupancy changes go through [`GridMap::place_unit`] so that the
//! old and new tile are updated together or not at all.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TacticsError};
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::UnitId;

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct GridCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (4-connected) distance to `other`.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Coordinate shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<GridCoord> for (i32, i32) {
    fn from(coord: GridCoord) -> Self {
        (coord.x, coord.y)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Protection a tile or a crossed object offers against incoming fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CoverLevel {
    /// No protection.
    #[default]
    None,
    /// Low wall, crates.
    Half,
    /// Pillars, high walls.
    Full,
}

impl CoverLevel {
    /// Hit-chance penalty applied when this cover lies on the line of fire.
    #[must_use]
    pub const fn hit_penalty(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Half => 25,
            Self::Full => 50,
        }
    }

    /// Score used by the AI when ranking cover positions.
    #[must_use]
    pub const fn ai_score(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Half => 1,
            Self::Full => 2,
        }
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Position of this tile.
    pub coord: GridCoord,
    /// Whether units may stand on or path through this tile.
    pub walkable: bool,
    /// Cover this tile provides.
    pub cover: CoverLevel,
    /// Unit currently standing here.
    pub occupant: Option<UnitId>,
}

impl Tile {
    /// Whether a unit stands on this tile.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Cardinal neighbour offsets, in the order neighbours are reported.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Tactical map: a fixed-size rectangle of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
    /// Size of each tile in world units.
    #[serde(with = "crate::math::fixed_serde")]
    cell_size: Fixed,
}

/// A grid built from an ASCII layout, plus the obstacle cells found in it.
#[derive(Debug, Clone)]
pub struct MapLayout {
    /// The constructed grid.
    pub grid: GridMap,
    /// Cells holding solid obstacles that block line of fire outright.
    pub obstacles: Vec<GridCoord>,
}

impl GridMap {
    /// Create a grid with every tile walkable and without cover.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `cell_size` is not positive.
    #[must_use]
    pub fn new(width: u32, height: u32, cell_size: Fixed) -> Self {
        assert!(width > 0, "GridMap width must be positive");
        assert!(height > 0, "GridMap height must be positive");
        assert!(cell_size > Fixed::ZERO, "GridMap cell_size must be positive");

        let mut tiles = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    coord: GridCoord::new(x as i32, y as i32),
                    walkable: true,
                    cover: CoverLevel::None,
                    occupant: None,
                });
            }
        }

        Self {
            width,
            height,
            tiles,
            cell_size,
        }
    }

    /// Build a grid from ASCII rows. Row `0` is `y = 0`.
    ///
    /// | char | tile |
    /// |------|------|
    /// | `.`  | open floor |
    /// | `#`  | obstacle: impassable, full cover, blocks line of fire |
    /// | `h`/`f` | walkable tile with half/full cover |
    /// | `H`/`F` | impassable half/full cover object |
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::InvalidLayout`] for empty or ragged layouts,
    /// unknown characters, or a non-positive cell size.
    pub fn from_layout<S: AsRef<str>>(rows: &[S], cell_size: Fixed) -> Result<MapLayout> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        if width == 0 || height == 0 {
            return Err(TacticsError::InvalidLayout("layout is empty".into()));
        }
        if cell_size <= Fixed::ZERO {
            return Err(TacticsError::InvalidLayout("cell size must be positive".into()));
        }

        let mut grid = Self::new(width as u32, height as u32, cell_size);
        let mut obstacles = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(TacticsError::InvalidLayout(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let coord = GridCoord::new(x as i32, y as i32);
                let (walkable, cover) = match ch {
                    '.' => (true, CoverLevel::None),
                    '#' => {
                        obstacles.push(coord);
                        (false, CoverLevel::Full)
                    }
                    'h' => (true, CoverLevel::Half),
                    'f' => (true, CoverLevel::Full),
                    'H' => (false, CoverLevel::Half),
                    'F' => (false, CoverLevel::Full),
                    other => {
                        return Err(TacticsError::InvalidLayout(format!(
                            "unknown tile '{other}' at {coord}"
                        )))
                    }
                };
                grid.set_walkable(coord, walkable);
                grid.set_cover(coord, cover);
            }
        }

        Ok(MapLayout { grid, obstacles })
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile size in world units.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    #[inline]
    fn index_of(&self, coord: GridCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some((coord.y as usize) * (self.width as usize) + (coord.x as usize))
        } else {
            None
        }
    }

    /// Check if a coordinate lies on the map.
    #[must_use]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    /// Tile at `coord`, or `None` when off the map.
    #[must_use]
    pub fn tile_at(&self, coord: GridCoord) -> Option<&Tile> {
        self.index_of(coord).map(|i| &self.tiles[i])
    }

    fn tile_at_mut(&mut self, coord: GridCoord) -> Option<&mut Tile> {
        self.index_of(coord).map(move |i| &mut self.tiles[i])
    }

    /// Iterate all tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Check if a tile exists and is walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.tile_at(coord).is_some_and(|t| t.walkable)
    }

    /// Unit standing on `coord`, if any.
    #[must_use]
    pub fn occupant(&self, coord: GridCoord) -> Option<UnitId> {
        self.tile_at(coord).and_then(|t| t.occupant)
    }

    /// Check if a unit stands on `coord`.
    #[must_use]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.occupant(coord).is_some()
    }

    /// Cover of the tile at `coord`; off-map tiles offer none.
    #[must_use]
    pub fn cover_at(&self, coord: GridCoord) -> CoverLevel {
        self.tile_at(coord).map_or(CoverLevel::None, |t| t.cover)
    }

    /// Set walkability. Returns `false` if out of bounds.
    ///
    /// Intended for the map scan step that runs before a match.
    pub fn set_walkable(&mut self, coord: GridCoord, walkable: bool) -> bool {
        match self.tile_at_mut(coord) {
            Some(tile) => {
                tile.walkable = walkable;
                true
            }
            None => false,
        }
    }

    /// Set tile cover. Returns `false` if out of bounds.
    pub fn set_cover(&mut self, coord: GridCoord, cover: CoverLevel) -> bool {
        match self.tile_at_mut(coord) {
            Some(tile) => {
                tile.cover = cover;
                true
            }
            None => false,
        }
    }

    /// Walkable cardinal neighbours of `coord` in +x, -x, +y, -y order.
    ///
    /// Occupied tiles are included.
    #[must_use]
    pub fn neighbors(&self, coord: GridCoord) -> Vec<GridCoord> {
        DIRECTIONS
            .iter()
            .map(|&(dx, dy)| coord.offset(dx, dy))
            .filter(|&n| self.is_walkable(n))
            .collect()
    }

    /// Convert a world position to the nearest grid coordinate.
    ///
    /// The result may lie off the map; look it up with [`Self::tile_at`].
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec2Fixed) -> GridCoord {
        GridCoord::new(
            (pos.x / self.cell_size).round().saturating_to_num::<i32>(),
            (pos.y / self.cell_size).round().saturating_to_num::<i32>(),
        )
    }

    /// Convert a grid coordinate to its world position (tile centre).
    #[must_use]
    pub fn grid_to_world(&self, coord: GridCoord) -> Vec2Fixed {
        Vec2Fixed::new(
            Fixed::from_num(coord.x) * self.cell_size,
            Fixed::from_num(coord.y) * self.cell_size,
        )
    }

    /// Move `unit` from `from` onto `to`.
    ///
    /// Fails without touching either tile if `to` is off the map, not
    /// walkable, or already occupied. The old tile is only cleared when it
    /// actually names `unit`.
    pub fn place_unit(&mut self, unit: UnitId, from: Option<GridCoord>, to: GridCoord) -> bool {
        match self.tile_at(to) {
            Some(tile) if tile.walkable && !tile.is_occupied() => {}
            _ => return false,
        }

        if let Some(old) = from.and_then(|c| self.tile_at_mut(c)) {
            if old.occupant == Some(unit) {
                old.occupant = None;
            }
        }
        if let Some(target) = self.tile_at_mut(to) {
            target.occupant = Some(unit);
        }
        true
    }

    /// Clear `coord` if `unit` is its occupant.
    pub fn vacate(&mut self, coord: GridCoord, unit: UnitId) {
        if let Some(tile) = self.tile_at_mut(coord) {
            if tile.occupant == Some(unit) {
                tile.occupant = None;
            }
        }
    }
}

impl Default for GridMap {
    /// The 12x12 skirmish map with unit-sized cells.
    fn default() -> Self {
        Self::new(12, 12, Fixed::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_grid_creation() {
        let grid = GridMap::new(10, 8, Fixed::from_num(2));
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.tiles().count(), 80);
        assert!(grid.is_walkable(c(9, 7)));
        assert!(grid.tile_at(c(10, 0)).is_none());
        assert!(grid.tile_at(c(-1, 0)).is_none());
    }

    #[test]
    fn test_neighbor_order_and_filtering() {
        let mut grid = GridMap::new(5, 5, Fixed::ONE);
        assert_eq!(
            grid.neighbors(c(2, 2)),
            vec![c(3, 2), c(1, 2), c(2, 3), c(2, 1)]
        );

        grid.set_walkable(c(3, 2), false);
        assert_eq!(grid.neighbors(c(2, 2)), vec![c(1, 2), c(2, 3), c(2, 1)]);

        // Corner: only two neighbours exist.
        assert_eq!(grid.neighbors(c(0, 0)), vec![c(1, 0), c(0, 1)]);
    }

    #[test]
    fn test_neighbors_include_occupied_tiles() {
        let mut grid = GridMap::new(3, 3, Fixed::ONE);
        assert!(grid.place_unit(UnitId(7), None, c(1, 0)));
        assert!(grid.neighbors(c(0, 0)).contains(&c(1, 0)));
    }

    #[test]
    fn test_world_grid_transforms() {
        let grid = GridMap::new(10, 10, Fixed::from_num(2));
        let world = grid.grid_to_world(c(3, 4));
        assert_eq!(world, Vec2Fixed::new(Fixed::from_num(6), Fixed::from_num(8)));
        assert_eq!(grid.world_to_grid(world), c(3, 4));

        // Nearest tile wins.
        let near = Vec2Fixed::new(Fixed::from_num(6.8), Fixed::from_num(7.2));
        assert_eq!(grid.world_to_grid(near), c(3, 4));

        // Off-map positions still convert, but have no tile.
        let off = grid.world_to_grid(Vec2Fixed::new(Fixed::from_num(-4), Fixed::ZERO));
        assert_eq!(off, c(-2, 0));
        assert!(grid.tile_at(off).is_none());
    }

    #[test]
    fn test_place_unit_moves_occupancy_atomically() {
        let mut grid = GridMap::new(4, 4, Fixed::ONE);
        let a = UnitId(1);
        let b = UnitId(2);

        assert!(grid.place_unit(a, None, c(0, 0)));
        assert!(grid.place_unit(b, None, c(1, 0)));

        // Occupied target: nothing changes.
        assert!(!grid.place_unit(a, Some(c(0, 0)), c(1, 0)));
        assert_eq!(grid.occupant(c(0, 0)), Some(a));
        assert_eq!(grid.occupant(c(1, 0)), Some(b));

        // Unwalkable target: nothing changes.
        grid.set_walkable(c(0, 1), false);
        assert!(!grid.place_unit(a, Some(c(0, 0)), c(0, 1)));
        assert_eq!(grid.occupant(c(0, 0)), Some(a));

        // Off-map target.
        assert!(!grid.place_unit(a, Some(c(0, 0)), c(9, 9)));

        assert!(grid.place_unit(a, Some(c(0, 0)), c(2, 0)));
        assert_eq!(grid.occupant(c(0, 0)), None);
        assert_eq!(grid.occupant(c(2, 0)), Some(a));
    }

    #[test]
    fn test_place_unit_does_not_clear_foreign_tile() {
        let mut grid = GridMap::new(4, 4, Fixed::ONE);
        assert!(grid.place_unit(UnitId(1), None, c(0, 0)));
        // Unit 2 claims to come from (0, 0) but does not occupy it.
        assert!(grid.place_unit(UnitId(2), Some(c(0, 0)), c(3, 3)));
        assert_eq!(grid.occupant(c(0, 0)), Some(UnitId(1)));
    }

    #[test]
    fn test_vacate() {
        let mut grid = GridMap::new(2, 2, Fixed::ONE);
        assert!(grid.place_unit(UnitId(1), None, c(1, 1)));
        grid.vacate(c(1, 1), UnitId(2));
        assert!(grid.is_occupied(c(1, 1)));
        grid.vacate(c(1, 1), UnitId(1));
        assert!(!grid.is_occupied(c(1, 1)));
    }

    #[test]
    fn test_from_layout() {
        let layout = GridMap::from_layout(&["..h", "#.F", "f.H"], Fixed::ONE).unwrap();
        let grid = &layout.grid;
        assert_eq!((grid.width(), grid.height()), (3, 3));
        assert_eq!(layout.obstacles, vec![c(0, 1)]);

        assert_eq!(grid.cover_at(c(2, 0)), CoverLevel::Half);
        assert!(grid.is_walkable(c(2, 0)));
        assert!(!grid.is_walkable(c(0, 1)));
        assert_eq!(grid.cover_at(c(0, 1)), CoverLevel::Full);
        assert!(!grid.is_walkable(c(2, 1)));
        assert_eq!(grid.cover_at(c(0, 2)), CoverLevel::Full);
        assert!(grid.is_walkable(c(0, 2)));
    }

    #[test]
    fn test_from_layout_rejects_bad_input() {
        assert!(GridMap::from_layout::<&str>(&[], Fixed::ONE).is_err());
        assert!(GridMap::from_layout(&["...", ".."], Fixed::ONE).is_err());
        assert!(GridMap::from_layout(&["..x"], Fixed::ONE).is_err());
        assert!(GridMap::from_layout(&["..."], Fixed::ZERO).is_err());
    }

    #[test]
    fn test_cover_values() {
        assert_eq!(CoverLevel::None.hit_penalty(), 0);
        assert_eq!(CoverLevel::Half.hit_penalty(), 25);
        assert_eq!(CoverLevel::Full.hit_penalty(), 50);
        assert_eq!(CoverLevel::Full.ai_score(), 2);
        assert!(CoverLevel::Full > CoverLevel::Half);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(c(0, 0).manhattan(c(3, -4)), 7);
        assert_eq!(c(2, 2).manhattan(c(2, 2)), 0);
    }
}
