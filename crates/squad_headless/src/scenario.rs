//! Scenario loading and configuration.
//!
//! A scenario is everything needed to start a match: the map, the class
//! table, both rosters, rule overrides and a default seed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use squad_core::ai::AiWeights;
use squad_core::data::{CharacterClass, ClassRegistry, RulesConfig};
use squad_core::error::TacticsError;
use squad_core::grid::{GridCoord, GridMap};
use squad_core::math::{fixed_decimal_serde, Fixed};
use squad_core::simulation::{TacticsSim, UnitSpawn};
use squad_core::unit::Side;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario's map or rosters were rejected by the core.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] TacticsError),
}

/// A complete scenario configuration.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Corridor",
///     map: [
///         "..h..",
///         "..#..",
///     ],
///     classes: { "rifle": () },
///     players: [(name: "Alpha", class: "rifle", position: (0, 0))],
///     enemies: [(name: "Grunt", class: "rifle", position: (4, 1))],
///     max_rounds: Some(20),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// ASCII map rows, see [`GridMap::from_layout`].
    pub map: Vec<String>,
    /// Tile size in world units.
    #[serde(with = "fixed_decimal_serde")]
    pub cell_size: Fixed,
    /// Class id to template.
    pub classes: BTreeMap<String, CharacterClass>,
    /// Player roster, in turn order.
    pub players: Vec<UnitSpawn>,
    /// Enemy roster, in turn order.
    pub enemies: Vec<UnitSpawn>,
    /// Rule overrides.
    pub rules: RulesConfig,
    /// Seed used when none is given on the command line.
    pub seed: u64,
    /// Round limit; overrides `rules.round_limit` when set.
    pub max_rounds: Option<u32>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a command-line scenario argument: a path to a RON file, or
    /// `None` for the built-in skirmish.
    pub fn resolve(arg: Option<&Path>) -> Result<Self, ScenarioError> {
        match arg {
            Some(path) => Self::load(path),
            None => Ok(Self::skirmish()),
        }
    }

    /// The built-in three-a-side skirmish on a 12x12 map with cover.
    #[must_use]
    pub fn skirmish() -> Self {
        let map = [
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
        ];

        let mut classes = BTreeMap::new();
        classes.insert("rifle".to_string(), CharacterClass::default());
        classes.insert(
            "sniper".to_string(),
            CharacterClass {
                name: "Sniper".to_string(),
                max_hp: 7,
                aim: 85,
                move_range: 4,
                max_ammo: 3,
                damage: 5,
                ..CharacterClass::default()
            },
        );
        classes.insert(
            "heavy".to_string(),
            CharacterClass {
                name: "Heavy".to_string(),
                max_hp: 14,
                aim: 60,
                move_range: 4,
                damage: 4,
                can_take_cover: false,
                ..CharacterClass::default()
            },
        );

        let at = GridCoord::new;
        Self {
            name: "Skirmish".to_string(),
            description: "Three a side across a cluttered yard".to_string(),
            map: map.iter().map(|row| (*row).to_string()).collect(),
            cell_size: Fixed::ONE,
            classes,
            players: vec![
                UnitSpawn::new("Alpha", "rifle", at(0, 0)),
                UnitSpawn::new("Bravo", "sniper", at(1, 0)),
                UnitSpawn::new("Charlie", "heavy", at(0, 1)),
            ],
            enemies: vec![
                UnitSpawn::new("Grunt", "rifle", at(11, 11)),
                UnitSpawn::new("Marksman", "sniper", at(10, 11))
                    .with_weights(AiWeights::new(6, 1, 2, 1)),
                UnitSpawn::new("Brute", "heavy", at(11, 10))
                    .with_weights(AiWeights::new(4, 6, 0, 0)),
            ],
            rules: RulesConfig::default(),
            seed: 12345,
            max_rounds: Some(40),
        }
    }

    /// Rules with the scenario's round limit applied.
    #[must_use]
    pub fn effective_rules(&self) -> RulesConfig {
        let mut rules = self.rules.clone();
        if self.max_rounds.is_some() {
            rules.round_limit = self.max_rounds;
        }
        rules
    }

    /// Build the scenario into a match with seeded dice and begin it.
    ///
    /// Both sides are played by the decision policy when `autopilot` is set;
    /// otherwise only the enemy is, and the match stops at the first player
    /// unit's turn.
    pub fn build(&self, seed: u64, autopilot: bool) -> Result<TacticsSim, ScenarioError> {
        let layout = GridMap::from_layout(self.map.as_slice(), self.cell_size)?;
        let classes: ClassRegistry = self.classes.clone().into_iter().collect();

        let mut sim = TacticsSim::from_layout(layout, classes, self.effective_rules(), seed);
        sim.set_autopilot(Side::Player, autopilot);

        tracing::debug!(
            scenario = %self.name,
            seed,
            players = self.players.len(),
            enemies = self.enemies.len(),
            "Building match"
        );
        sim.begin_match(self.players.clone(), self.enemies.clone())?;
        Ok(sim)
    }
}
