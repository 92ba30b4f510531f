//! The match context.
//!
//! [`TacticsSim`] owns the map, the units and the turn controller, plus the
//! injected collaborators: a [`LineOfFire`] oracle and a [`Dice`] source.
//! Front ends drive it through the `try_*` commands and
//! [`TacticsSim::end_current_unit_turn`], and read back what happened from
//! the event queue.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::AiWeights;
use crate::combat::{resolve_shot, FireContext, ShotOutcome, ShotRejection, ShotRequest};
use crate::data::{CharacterClass, ClassRegistry, RulesConfig};
use crate::dice::{Dice, SeededDice};
use crate::error::{Result, TacticsError};
use crate::events::{MatchEvent, PresentationSink};
use crate::grid::{GridCoord, GridMap, MapLayout, Tile};
use crate::los::{GridLineOfFire, LineOfFire};
use crate::pathfinding;
use crate::turn::{MatchResult, TurnController, TurnState, TurnStep};
use crate::unit::{Side, Unit, UnitId};

/// A roster entry handed to [`TacticsSim::begin_match`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Display name.
    pub name: String,
    /// Character class id in the registry.
    pub class: String,
    /// Spawn tile.
    pub position: GridCoord,
    /// AI weights; AI-driven units without them use the defaults.
    #[serde(default)]
    pub weights: Option<AiWeights>,
}

impl UnitSpawn {
    /// Create a spawn entry without explicit weights.
    #[must_use]
    pub fn new(name: impl Into<String>, class: impl Into<String>, position: GridCoord) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            position,
            weights: None,
        }
    }

    /// Builder method to set AI weights.
    #[must_use]
    pub fn with_weights(mut self, weights: AiWeights) -> Self {
        self.weights = Some(weights);
        self
    }
}

/// Why a move command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRejection {
    /// No such unit in play.
    UnknownUnit,
    /// The unit is not the active, externally controlled unit.
    NotActiveUnit,
    /// Destination off the map, not walkable, or occupied.
    InvalidDestination,
    /// Not enough AP to pay for the move.
    InsufficientAp,
    /// No route to the destination.
    NoPath,
}

/// What happened during a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// Moving unit.
    pub unit: UnitId,
    /// Tiles the unit stood on, start first.
    pub path: Vec<GridCoord>,
    /// Whether every planned step was taken.
    pub completed: bool,
    /// Whether reactive fire killed the unit on the way.
    pub killed: bool,
}

/// Result of a move command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing changed.
    Rejected(MoveRejection),
    /// AP was spent and the unit walked.
    Moved(MoveReport),
}

impl MoveOutcome {
    /// Check if the move went ahead.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    /// The report of an accepted move.
    #[must_use]
    pub const fn report(&self) -> Option<&MoveReport> {
        match self {
            Self::Moved(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason of a refused move.
    #[must_use]
    pub const fn rejection(&self) -> Option<MoveRejection> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            Self::Moved(_) => None,
        }
    }
}

/// Why a command could not be issued to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandRefusal {
    UnknownUnit,
    NotActiveUnit,
}

impl From<CommandRefusal> for MoveRejection {
    fn from(refusal: CommandRefusal) -> Self {
        match refusal {
            CommandRefusal::UnknownUnit => Self::UnknownUnit,
            CommandRefusal::NotActiveUnit => Self::NotActiveUnit,
        }
    }
}

impl From<CommandRefusal> for ShotRejection {
    fn from(refusal: CommandRefusal) -> Self {
        match refusal {
            CommandRefusal::UnknownUnit => Self::UnknownUnit,
            CommandRefusal::NotActiveUnit => Self::NotActiveUnit,
        }
    }
}

/// A running match.
///
/// Player-side units wait for commands; sides under autopilot (the enemy by
/// default) are played by the decision policy as soon as they become
/// active, so every public call returns with an externally controlled unit
/// active or the match over.
///
/// Turning autopilot on for both sides plays the whole match inside
/// [`begin_match`](Self::begin_match). Without a
/// [`RulesConfig::round_limit`] such a match is capped at
/// [`RulesConfig::autopilot_round_limit`] rounds, so a stalemate is drawn.
pub struct TacticsSim {
    pub(crate) grid: GridMap,
    pub(crate) classes: ClassRegistry,
    pub(crate) rules: RulesConfig,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) turns: TurnController,
    pub(crate) line_of_fire: Box<dyn LineOfFire>,
    pub(crate) dice: Box<dyn Dice>,
    events: Vec<MatchEvent>,
    next_id: u32,
    player_autopilot: bool,
    enemy_autopilot: bool,
}

impl fmt::Debug for TacticsSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacticsSim")
            .field("round", &self.turns.round())
            .field("state", &self.turns.state())
            .field("units", &self.units.len())
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl TacticsSim {
    /// Create a match context with injected collaborators.
    #[must_use]
    pub fn new(
        grid: GridMap,
        classes: ClassRegistry,
        rules: RulesConfig,
        line_of_fire: Box<dyn LineOfFire>,
        dice: Box<dyn Dice>,
    ) -> Self {
        let turns = TurnController::new(rules.round_limit);
        Self {
            grid,
            classes,
            rules,
            units: BTreeMap::new(),
            turns,
            line_of_fire,
            dice,
            events: Vec::new(),
            next_id: 0,
            player_autopilot: false,
            enemy_autopilot: true,
        }
    }

    /// Create a match on a parsed layout with grid line of fire and seeded dice.
    #[must_use]
    pub fn from_layout(layout: MapLayout, classes: ClassRegistry, rules: RulesConfig, seed: u64) -> Self {
        let MapLayout { grid, obstacles } = layout;
        Self::new(
            grid,
            classes,
            rules,
            Box::new(GridLineOfFire::new(obstacles)),
            Box::new(SeededDice::new(seed)),
        )
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Choose whether `side` is played by the decision policy.
    ///
    /// Takes effect from that side's next activation.
    pub fn set_autopilot(&mut self, side: Side, enabled: bool) {
        match side {
            Side::Player => self.player_autopilot = enabled,
            Side::Enemy => self.enemy_autopilot = enabled,
        }
    }

    /// Check if `side` is played by the decision policy.
    #[must_use]
    pub const fn is_autopiloted(&self, side: Side) -> bool {
        match side {
            Side::Player => self.player_autopilot,
            Side::Enemy => self.enemy_autopilot,
        }
    }

    /// Spawn both rosters and activate the first unit.
    ///
    /// A roster entry naming an unregistered class is logged and spawned
    /// with an inactive template; it is removed again before anyone acts.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::InvalidState`] if a match was already begun,
    /// or [`TacticsError::InvalidPlacement`] if a spawn tile is off the map,
    /// not walkable or taken. Nothing is spawned on error.
    pub fn begin_match(&mut self, players: Vec<UnitSpawn>, enemies: Vec<UnitSpawn>) -> Result<()> {
        if self.turns.state() != TurnState::AwaitingRoundStart || !self.units.is_empty() {
            return Err(TacticsError::InvalidState("match already begun".into()));
        }

        let (player_ids, enemy_ids) = match self.spawn_rosters(players, enemies) {
            Ok(ids) => ids,
            Err(e) => {
                self.clear_units();
                return Err(e);
            }
        };

        tracing::info!(
            players = player_ids.len(),
            enemies = enemy_ids.len(),
            "Match started"
        );
        self.emit(MatchEvent::MatchStarted {
            players: player_ids.len(),
            enemies: enemy_ids.len(),
        });
        self.emit(MatchEvent::RoundStarted { round: 1 });

        self.turns.begin(player_ids, enemy_ids);
        self.advance_turn();
        Ok(())
    }

    fn spawn_rosters(
        &mut self,
        players: Vec<UnitSpawn>,
        enemies: Vec<UnitSpawn>,
    ) -> Result<(Vec<UnitId>, Vec<UnitId>)> {
        let player_ids = players
            .into_iter()
            .map(|spawn| self.spawn(spawn, Side::Player))
            .collect::<Result<Vec<_>>>()?;
        let enemy_ids = enemies
            .into_iter()
            .map(|spawn| self.spawn(spawn, Side::Enemy))
            .collect::<Result<Vec<_>>>()?;
        Ok((player_ids, enemy_ids))
    }

    fn spawn(&mut self, spawn: UnitSpawn, side: Side) -> Result<UnitId> {
        let class = self.classes.get(&spawn.class).unwrap_or_else(|| {
            tracing::error!(
                class = %spawn.class,
                unit = %spawn.name,
                "Unknown character class, spawning inactive unit"
            );
            Arc::new(CharacterClass::inactive(spawn.class.clone()))
        });

        let id = UnitId(self.next_id);
        let mut unit = Unit::new(id, spawn.name, side, class, spawn.position);
        if let Some(mut weights) = spawn.weights {
            weights.clamp_and_fix_total();
            unit = unit.with_weights(weights);
        }

        if unit.is_alive() && !self.grid.place_unit(id, None, spawn.position) {
            let reason = match self.grid.tile_at(spawn.position) {
                None => "off the map",
                Some(tile) if !tile.walkable => "not walkable",
                Some(_) => "already occupied",
            };
            return Err(TacticsError::InvalidPlacement {
                unit: unit.name,
                coord: spawn.position,
                reason: reason.to_string(),
            });
        }

        tracing::debug!(unit = %id, name = %unit.name, ?side, pos = %unit.grid_pos, "Unit spawned");
        self.next_id += 1;
        self.units.insert(id, unit);
        Ok(id)
    }

    fn clear_units(&mut self) {
        for (id, unit) in &self.units {
            self.grid.vacate(unit.grid_pos, *id);
        }
        self.units.clear();
        self.next_id = 0;
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// End the active unit's turn and move on.
    ///
    /// Returns false, doing nothing, while the decision policy is acting,
    /// before the match begins, or after it ends.
    pub fn end_current_unit_turn(&mut self) -> bool {
        if self.turns.is_ai_acting() {
            tracing::debug!("End turn ignored while the AI is acting");
            return false;
        }
        let TurnState::UnitActive(unit) = self.turns.state() else {
            tracing::debug!(state = ?self.turns.state(), "End turn ignored without an active unit");
            return false;
        };

        tracing::debug!(unit = %unit, "Turn ended");
        self.advance_turn();
        true
    }

    /// Activate units until one waits for external input or the match ends.
    fn advance_turn(&mut self) {
        self.cap_unattended_match();
        loop {
            let units = &self.units;
            let advance = self
                .turns
                .advance(|id| units.get(&id).is_some_and(Unit::is_alive));

            for id in advance.removed {
                self.remove_unit(id);
            }

            match advance.step {
                TurnStep::Ended(result) => {
                    tracing::info!(?result, round = self.turns.round(), "Match over");
                    self.emit(MatchEvent::MatchEnded { result });
                    return;
                }
                TurnStep::Activated {
                    unit,
                    round_started,
                } => {
                    if let Some(round) = round_started {
                        tracing::info!(round, "Round started");
                        self.emit(MatchEvent::RoundStarted { round });
                    }
                    let Some(side) = self.start_unit_turn(unit) else {
                        continue;
                    };
                    if !self.is_autopiloted(side) {
                        return;
                    }
                    self.run_ai_activation(unit);
                }
            }
        }
    }

    /// Nobody is left to end a match played by the policy on both sides.
    fn cap_unattended_match(&mut self) {
        if !(self.player_autopilot && self.enemy_autopilot) || self.turns.round_limit().is_some() {
            return;
        }
        let limit = self.rules.autopilot_round_limit.max(self.turns.round());
        tracing::warn!(limit, "Both sides on autopilot without a round limit, capping rounds");
        self.turns.set_round_limit(Some(limit));
    }

    fn start_unit_turn(&mut self, id: UnitId) -> Option<Side> {
        let unit = self.units.get_mut(&id)?;
        unit.begin_turn();

        // An overwatch stance lasts until the unit's own next turn.
        if unit.is_overwatch {
            unit.clear_overwatch();
            self.events.push(MatchEvent::OverwatchCleared { unit: id });
        }

        let side = unit.side;
        tracing::debug!(
            unit = %id,
            name = %unit.name,
            ?side,
            ap = unit.ap,
            max_ap = unit.class.max_ap,
            "Turn started"
        );
        self.events.push(MatchEvent::TurnStarted {
            unit: id,
            side,
            round: self.turns.round(),
        });
        Some(side)
    }

    fn remove_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.remove(&id) {
            self.grid.vacate(unit.grid_pos, id);
            tracing::debug!(unit = %id, name = %unit.name, "Unit removed");
            self.emit(MatchEvent::UnitRemoved { unit: id });
        }
    }

    /// Whether `side` still has a living unit in its roster.
    pub(crate) fn side_has_living(&self, side: Side) -> bool {
        self.turns
            .roster(side)
            .iter()
            .any(|id| self.units.get(id).is_some_and(Unit::is_alive))
    }

    /// End the match at once if an action wiped out a side.
    fn settle_after_command(&mut self) {
        if !self.side_has_living(Side::Player) || !self.side_has_living(Side::Enemy) {
            self.advance_turn();
        }
        #[cfg(feature = "debug-validation")]
        self.validate_occupancy();
    }

    /// Panic if tile occupancy and unit positions disagree.
    #[cfg(feature = "debug-validation")]
    fn validate_occupancy(&self) {
        for tile in self.grid.tiles() {
            if let Some(id) = tile.occupant {
                let unit = self.units.get(&id);
                assert!(
                    unit.is_some_and(|u| u.grid_pos == tile.coord),
                    "tile {} names unit {id} which stands elsewhere",
                    tile.coord
                );
            }
        }
        for (id, unit) in &self.units {
            if unit.is_alive() {
                assert_eq!(
                    self.grid.occupant(unit.grid_pos),
                    Some(*id),
                    "unit {id} is not on its tile"
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn check_command(&self, id: UnitId) -> std::result::Result<&Unit, CommandRefusal> {
        let unit = self.units.get(&id).ok_or(CommandRefusal::UnknownUnit)?;
        if self.turns.current() != Some(id) || self.turns.is_ai_acting() || unit.is_dead() {
            return Err(CommandRefusal::NotActiveUnit);
        }
        Ok(unit)
    }

    /// Walk the active unit toward `destination`.
    ///
    /// The route is cut to the unit's move range and costs `move_ap_cost`
    /// once, however many tiles are walked. Each step may draw reactive fire.
    pub fn try_move_unit(&mut self, id: UnitId, destination: GridCoord) -> MoveOutcome {
        let unit = match self.check_command(id) {
            Ok(unit) => unit,
            Err(refusal) => {
                tracing::warn!(unit = %id, ?refusal, "Move refused");
                return MoveOutcome::Rejected(refusal.into());
            }
        };

        let start = unit.grid_pos;
        let cost = unit.class.move_ap_cost;
        let range = unit.class.move_range;

        let rejection = match self.grid.tile_at(destination) {
            Some(tile) if tile.walkable && !tile.is_occupied() => None,
            _ => Some(MoveRejection::InvalidDestination),
        }
        .or_else(|| (unit.ap < cost).then_some(MoveRejection::InsufficientAp));

        let path = match rejection {
            Some(reason) => Err(reason),
            None => pathfinding::find_path(&self.grid, start, destination)
                .filter(|path| path.len() > 1)
                .ok_or(MoveRejection::NoPath),
        };
        let path = match path {
            Ok(path) => pathfinding::truncate_path(&path, range),
            Err(reason) => {
                tracing::warn!(unit = %id, %destination, ?reason, "Move refused");
                return MoveOutcome::Rejected(reason);
            }
        };

        if let Some(unit) = self.units.get_mut(&id) {
            unit.spend_ap(cost);
        }
        let report = self.walk_path(id, &path);
        self.settle_after_command();
        MoveOutcome::Moved(report)
    }

    /// Take an aimed shot with the active unit.
    pub fn try_fire(&mut self, attacker: UnitId, target: UnitId) -> ShotOutcome {
        if let Err(refusal) = self.check_command(attacker) {
            tracing::warn!(unit = %attacker, ?refusal, "Fire refused");
            return ShotOutcome::Rejected(refusal.into());
        }

        let request = ShotRequest::aimed(self.rules.fire_ap_cost, self.rules.max_fire_range);
        let outcome = self.fire(attacker, target, &request);
        if let ShotOutcome::Rejected(reason) = &outcome {
            tracing::warn!(unit = %attacker, target = %target, ?reason, "Shot refused");
        }
        self.settle_after_command();
        outcome
    }

    /// Reload the active unit.
    pub fn try_reload(&mut self, id: UnitId) -> bool {
        if let Err(refusal) = self.check_command(id) {
            tracing::warn!(unit = %id, ?refusal, "Reload refused");
            return false;
        }
        let reloaded = self.reload_unit(id);
        if !reloaded {
            tracing::warn!(unit = %id, "Reload refused: not enough AP");
        }
        reloaded
    }

    /// Put the active unit on overwatch.
    pub fn try_enter_overwatch(&mut self, id: UnitId) -> bool {
        if let Err(refusal) = self.check_command(id) {
            tracing::warn!(unit = %id, ?refusal, "Overwatch refused");
            return false;
        }
        let entered = self.enter_overwatch_unit(id);
        if !entered {
            tracing::warn!(unit = %id, "Overwatch refused");
        }
        entered
    }

    // ------------------------------------------------------------------
    // Actions shared by commands and the decision policy
    // ------------------------------------------------------------------

    /// Walk `path` one tile at a time, starting from its first tile.
    ///
    /// A step onto a tile that became blocked or occupied ends the walk.
    /// After every step opposing overwatchers may react; the walk stops if
    /// the mover dies.
    pub(crate) fn walk_path(&mut self, id: UnitId, path: &[GridCoord]) -> MoveReport {
        let mut walked: Vec<GridCoord> = path.first().copied().into_iter().collect();
        let mut killed = false;

        for &next in path.iter().skip(1) {
            let Some(from) = self.units.get(&id).map(|u| u.grid_pos) else {
                break;
            };
            if !self.grid.is_walkable(next) || self.grid.is_occupied(next) {
                tracing::debug!(unit = %id, to = %next, "Step blocked");
                break;
            }
            if !self.grid.place_unit(id, Some(from), next) {
                break;
            }
            if let Some(unit) = self.units.get_mut(&id) {
                unit.grid_pos = next;
            }
            walked.push(next);

            tracing::debug!(unit = %id, %from, to = %next, "Unit stepped");
            self.emit(MatchEvent::UnitStepped {
                unit: id,
                from,
                to: next,
            });

            self.trigger_reactive_fire(id);
            if self.units.get(&id).map_or(true, Unit::is_dead) {
                killed = true;
                break;
            }
        }

        MoveReport {
            unit: id,
            completed: walked.len() == path.len(),
            path: walked,
            killed,
        }
    }

    /// Give opposing overwatchers, in roster order, a shot at `mover`.
    ///
    /// The first watcher within range whose shot is actually taken uses up
    /// its overwatch; nobody else fires at this step.
    fn trigger_reactive_fire(&mut self, mover: UnitId) {
        let Some(target) = self.units.get(&mover) else {
            return;
        };
        let side = target.side;
        let pos = target.grid_pos;
        let range = self.rules.overwatch_range;

        let watchers: Vec<UnitId> = self
            .turns
            .roster(side.opponent())
            .iter()
            .copied()
            .filter(|id| {
                self.units
                    .get(id)
                    .is_some_and(|w| w.overwatch_ready() && w.grid_pos.manhattan(pos) <= range)
            })
            .collect();

        let request = ShotRequest::reactive(range);
        for watcher in watchers {
            if self.fire(watcher, mover, &request).is_fired() {
                break;
            }
        }
    }

    /// Resolve a shot between two units in play and record its events.
    pub(crate) fn fire(&mut self, attacker: UnitId, target: UnitId, request: &ShotRequest) -> ShotOutcome {
        if attacker == target {
            return ShotOutcome::Rejected(ShotRejection::SameUnit);
        }
        let Some(mut shooter) = self.units.remove(&attacker) else {
            return ShotOutcome::Rejected(ShotRejection::UnknownUnit);
        };

        let outcome = match self.units.get_mut(&target) {
            Some(victim) => {
                let ctx = FireContext {
                    grid: &self.grid,
                    line_of_fire: self.line_of_fire.as_ref(),
                    miss_offset_radius: self.rules.miss_offset_radius,
                };
                resolve_shot(&mut shooter, victim, request, &ctx, self.dice.as_mut())
            }
            None => ShotOutcome::Rejected(ShotRejection::UnknownUnit),
        };
        self.units.insert(attacker, shooter);

        if let ShotOutcome::Fired(report) = &outcome {
            if let Some(victim) = self.units.get(&target) {
                self.events.push(MatchEvent::UnitFaced {
                    unit: attacker,
                    toward: victim.grid_pos,
                });
            }
            self.events.push(MatchEvent::ShotFired(report.clone()));
            if report.target_killed {
                tracing::info!(unit = %target, killer = %attacker, "Unit killed");
                self.events.push(MatchEvent::UnitDied { unit: target });
            }
        }
        outcome
    }

    /// Reload `id`, paying the configured AP.
    pub(crate) fn reload_unit(&mut self, id: UnitId) -> bool {
        let cost = self.rules.reload_ap_cost;
        let reloaded = self.units.get_mut(&id).is_some_and(|unit| unit.reload(cost));
        if reloaded {
            tracing::debug!(unit = %id, "Reloaded");
            self.emit(MatchEvent::Reloaded { unit: id });
        }
        reloaded
    }

    /// Put `id` on overwatch, paying the configured AP.
    pub(crate) fn enter_overwatch_unit(&mut self, id: UnitId) -> bool {
        let cost = self.rules.overwatch_ap_cost;
        let enforce = self.rules.enforce_capabilities;
        let entered = self.units.get_mut(&id).is_some_and(|unit| {
            if enforce && !unit.class.can_overwatch {
                return false;
            }
            unit.enter_overwatch(cost)
        });
        if entered {
            tracing::debug!(unit = %id, "Overwatch entered");
            self.emit(MatchEvent::OverwatchEntered { unit: id });
        }
        entered
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The map.
    #[must_use]
    pub const fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Rule constants in effect.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Registered character classes.
    #[must_use]
    pub const fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Tile at `coord`, if on the map.
    #[must_use]
    pub fn tile_at(&self, coord: GridCoord) -> Option<&Tile> {
        self.grid.tile_at(coord)
    }

    /// Walkable neighbours of `coord`.
    #[must_use]
    pub fn neighbors(&self, coord: GridCoord) -> Vec<GridCoord> {
        self.grid.neighbors(coord)
    }

    /// Shortest path between two tiles on the current map.
    #[must_use]
    pub fn find_path(&self, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
        pathfinding::find_path(&self.grid, start, goal)
    }

    /// Tiles within `max_steps` of `start`.
    #[must_use]
    pub fn reachable_tiles(&self, start: GridCoord, max_steps: u32) -> Vec<GridCoord> {
        pathfinding::reachable(&self.grid, start, max_steps)
    }

    /// Tiles a unit could move to this action, for range overlays.
    #[must_use]
    pub fn movement_range(&self, id: UnitId) -> Vec<GridCoord> {
        match self.units.get(&id) {
            Some(unit) if unit.ap >= unit.class.move_ap_cost => {
                pathfinding::movement_range(&self.grid, unit.grid_pos, unit.class.move_range)
            }
            _ => Vec::new(),
        }
    }

    /// Unit by id, while it is in play.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All units in play, in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Roster of `side`, in spawn order.
    #[must_use]
    pub fn roster(&self, side: Side) -> &[UnitId] {
        self.turns.roster(side)
    }

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.turns.round()
    }

    /// Turn state.
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.turns.state()
    }

    /// Final result, once the match is over.
    #[must_use]
    pub const fn result(&self) -> Option<MatchResult> {
        match self.turns.state() {
            TurnState::GameOver(result) => Some(result),
            _ => None,
        }
    }

    /// The active unit.
    #[must_use]
    pub fn current_unit(&self) -> Option<&Unit> {
        self.turns.current().and_then(|id| self.units.get(&id))
    }

    /// Check if the active unit belongs to the player.
    #[must_use]
    pub fn is_player_turn(&self) -> bool {
        self.current_unit().is_some_and(|u| u.side == Side::Player)
    }

    /// Check if the active unit belongs to the enemy.
    #[must_use]
    pub fn is_enemy_turn(&self) -> bool {
        self.current_unit().is_some_and(|u| u.side == Side::Enemy)
    }

    // ------------------------------------------------------------------
    // Events and hashing
    // ------------------------------------------------------------------

    fn emit(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed every pending event to `sink`, oldest first.
    pub fn drain_events_into(&mut self, sink: &mut dyn PresentationSink) {
        for event in self.events.drain(..) {
            sink.on_event(&event);
        }
    }

    /// Hash of the match state for determinism checks.
    ///
    /// Covers the round, turn state, every unit in id order, and the map
    /// including occupancy. Pending events are not included.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turns.round().hash(&mut hasher);
        self.turns.state().hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for (id, unit) in &self.units {
            id.hash(&mut hasher);
            unit.side.hash(&mut hasher);
            unit.hp.hash(&mut hasher);
            unit.ap.hash(&mut hasher);
            unit.ammo.hash(&mut hasher);
            unit.grid_pos.hash(&mut hasher);
            unit.is_overwatch.hash(&mut hasher);
            unit.overwatch_used_this_round.hash(&mut hasher);
        }

        self.grid.hash(&mut hasher);
        hasher.finish()
    }
}
