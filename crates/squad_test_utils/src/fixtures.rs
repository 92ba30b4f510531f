//! Test fixtures and helpers.
//!
//! Pre-built maps, classes and rosters for consistent testing.

use fixed::types::I32F32;

use squad_core::ai::AiWeights;
use squad_core::data::{CharacterClass, ClassRegistry, RulesConfig};
use squad_core::dice::Dice;
use squad_core::grid::{GridCoord, GridMap};
use squad_core::los::{GridLineOfFire, LineOfFire, OpenField};
use squad_core::simulation::{TacticsSim, UnitSpawn};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Shorthand for a grid coordinate.
#[must_use]
pub const fn coord(x: i32, y: i32) -> GridCoord {
    GridCoord::new(x, y)
}

/// An open square map with unit cells.
#[must_use]
pub fn open_grid(size: u32) -> GridMap {
    GridMap::new(size, size, fixed(1))
}

/// The baseline rifle class: 10 HP, 2 AP, move 6, aim 70, 6 rounds, 3 damage.
#[must_use]
pub fn rifle() -> CharacterClass {
    CharacterClass::default()
}

/// A registry holding `"rifle"` plus any extra `(id, class)` pairs.
#[must_use]
pub fn registry(extra: impl IntoIterator<Item = (&'static str, CharacterClass)>) -> ClassRegistry {
    let mut classes = ClassRegistry::new();
    classes.insert("rifle", rifle());
    for (id, class) in extra {
        classes.insert(id, class);
    }
    classes
}

/// A rifle spawn at `(x, y)`.
#[must_use]
pub fn soldier(name: &str, x: i32, y: i32) -> UnitSpawn {
    UnitSpawn::new(name, "rifle", coord(x, y))
}

/// A rifle spawn that only ever enters overwatch, so it never moves or shoots.
#[must_use]
pub fn sentry(name: &str, x: i32, y: i32) -> UnitSpawn {
    soldier(name, x, y).with_weights(AiWeights::new(0, 0, 0, 10))
}

/// Builder for a two-squad match.
///
/// Defaults: a 12x12 open map, default rules, open-field line of fire,
/// the rifle registry and enemy autopilot on.
pub struct MatchBuilder {
    grid: GridMap,
    line_of_fire: Box<dyn LineOfFire>,
    classes: ClassRegistry,
    rules: RulesConfig,
    players: Vec<UnitSpawn>,
    enemies: Vec<UnitSpawn>,
    player_autopilot: bool,
}

impl Default for MatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchBuilder {
    /// Start from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: open_grid(12),
            line_of_fire: Box::new(OpenField),
            classes: registry([]),
            rules: RulesConfig::default(),
            players: Vec::new(),
            enemies: Vec::new(),
            player_autopilot: false,
        }
    }

    /// Use an ASCII layout; its obstacles block line of fire.
    ///
    /// # Panics
    ///
    /// Panics if the layout is invalid.
    #[must_use]
    pub fn layout(mut self, rows: &[&str]) -> Self {
        let layout = GridMap::from_layout(rows, fixed(1)).expect("fixture layout is valid");
        self.grid = layout.grid;
        self.line_of_fire = Box::new(GridLineOfFire::new(layout.obstacles));
        self
    }

    /// Use an open square map of `size`.
    #[must_use]
    pub fn open(mut self, size: u32) -> Self {
        self.grid = open_grid(size);
        self.line_of_fire = Box::new(OpenField);
        self
    }

    /// Replace the class registry.
    #[must_use]
    pub fn classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    /// Replace the rules.
    #[must_use]
    pub fn rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Add a player unit.
    #[must_use]
    pub fn player(mut self, spawn: UnitSpawn) -> Self {
        self.players.push(spawn);
        self
    }

    /// Add an enemy unit.
    #[must_use]
    pub fn enemy(mut self, spawn: UnitSpawn) -> Self {
        self.enemies.push(spawn);
        self
    }

    /// Let the decision policy play the player side too.
    #[must_use]
    pub fn player_autopilot(mut self) -> Self {
        self.player_autopilot = true;
        self
    }

    /// Build the match with `dice` and begin it.
    ///
    /// # Panics
    ///
    /// Panics if a spawn is invalid.
    #[must_use]
    pub fn begin(self, dice: impl Dice + 'static) -> TacticsSim {
        let mut sim = TacticsSim::new(
            self.grid,
            self.classes,
            self.rules,
            self.line_of_fire,
            Box::new(dice),
        );
        sim.set_autopilot(squad_core::unit::Side::Player, self.player_autopilot);
        sim.begin_match(self.players, self.enemies)
            .expect("fixture rosters are valid");
        sim
    }
}

/// A small seeded skirmish played entirely by the decision policy.
///
/// Three rifles a side on a map with scattered cover; the round limit
/// guarantees the match ends.
#[must_use]
pub fn autopilot_skirmish(seed: u64) -> TacticsSim {
    let layout = GridMap::from_layout(
        &[
            "............",
            "..h.....h...",
            "....##......",
            "......f.....",
            ".h.......#..",
            "............",
            "....h...h...",
            "..#.........",
            "......##....",
            ".f.......h..",
            "............",
            "............",
        ],
        fixed(1),
    )
    .expect("skirmish layout is valid");
    let rules = RulesConfig {
        round_limit: Some(40),
        ..RulesConfig::default()
    };
    let mut sim = TacticsSim::from_layout(layout, registry([]), rules, seed);
    sim.set_autopilot(squad_core::unit::Side::Player, true);
    sim.begin_match(
        vec![soldier("Alpha", 0, 0), soldier("Bravo", 1, 0), soldier("Charlie", 0, 1)],
        vec![soldier("Grunt", 11, 11), soldier("Sniper", 10, 11), soldier("Brute", 11, 10)],
    )
    .expect("skirmish rosters are valid");
    sim
}
