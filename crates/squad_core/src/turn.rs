//! Round and turn bookkeeping.
//!
//! A round activates every living unit once, alternating between the player
//! and enemy rosters. Rosters are pruned of dead units before each
//! activation, and a match ends the moment one roster runs empty.

use serde::{Deserialize, Serialize};

use crate::unit::{Side, UnitId};

/// Final result of a match, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    /// Every enemy is dead.
    Victory,
    /// Every player unit is dead.
    Defeat,
    /// The round limit ran out with both sides standing.
    Draw,
}

/// Where the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// Rosters are set up but no unit has been activated yet.
    AwaitingRoundStart,
    /// A unit is taking its turn.
    UnitActive(UnitId),
    /// Terminal state.
    GameOver(MatchResult),
}

impl TurnState {
    /// Check if the match has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver(_))
    }
}

/// What [`TurnController::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Dead units dropped from the rosters, players first.
    pub removed: Vec<UnitId>,
    /// The resulting step.
    pub step: TurnStep,
}

/// Outcome of moving to the next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStep {
    /// A unit became active.
    Activated {
        /// Newly active unit.
        unit: UnitId,
        /// Set when this activation opened a new round.
        round_started: Option<u32>,
    },
    /// The match ended.
    Ended(MatchResult),
}

/// Alternate the two rosters: player, enemy, player, enemy, ...
///
/// When one roster is longer its remaining units follow in order.
#[must_use]
pub fn build_turn_order(players: &[UnitId], enemies: &[UnitId]) -> Vec<UnitId> {
    let mut order = Vec::with_capacity(players.len() + enemies.len());
    let mut p = players.iter();
    let mut e = enemies.iter();
    loop {
        let next_player = p.next();
        let next_enemy = e.next();
        if next_player.is_none() && next_enemy.is_none() {
            break;
        }
        order.extend(next_player);
        order.extend(next_enemy);
    }
    order
}

/// Turn state machine over two rosters of unit ids.
///
/// The controller knows nothing about hit points; callers pass a liveness
/// predicate whenever rosters need pruning.
#[derive(Debug, Clone)]
pub struct TurnController {
    players: Vec<UnitId>,
    enemies: Vec<UnitId>,
    order: Vec<UnitId>,
    next: usize,
    round: u32,
    round_limit: Option<u32>,
    state: TurnState,
    ai_acting: bool,
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TurnController {
    /// Create a controller. With a `round_limit`, the match is drawn once
    /// that many rounds have been played.
    #[must_use]
    pub const fn new(round_limit: Option<u32>) -> Self {
        Self {
            players: Vec::new(),
            enemies: Vec::new(),
            order: Vec::new(),
            next: 0,
            round: 1,
            round_limit,
            state: TurnState::AwaitingRoundStart,
            ai_acting: false,
        }
    }

    /// Rounds after which the match is drawn, if any.
    #[must_use]
    pub const fn round_limit(&self) -> Option<u32> {
        self.round_limit
    }

    /// Replace the round limit.
    pub fn set_round_limit(&mut self, round_limit: Option<u32>) {
        self.round_limit = round_limit;
    }

    /// Install the rosters and build the first round's order.
    pub fn begin(&mut self, players: Vec<UnitId>, enemies: Vec<UnitId>) {
        self.order = build_turn_order(&players, &enemies);
        self.players = players;
        self.enemies = enemies;
        self.next = 0;
        self.round = 1;
        self.state = TurnState::AwaitingRoundStart;
        self.ai_acting = false;
        tracing::debug!(units = self.order.len(), "Turn order built");
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The active unit, if any.
    #[must_use]
    pub const fn current(&self) -> Option<UnitId> {
        match self.state {
            TurnState::UnitActive(unit) => Some(unit),
            _ => None,
        }
    }

    /// Activation order of the current round.
    #[must_use]
    pub fn order(&self) -> &[UnitId] {
        &self.order
    }

    /// Roster of one side, in spawn order.
    #[must_use]
    pub fn roster(&self, side: Side) -> &[UnitId] {
        match side {
            Side::Player => &self.players,
            Side::Enemy => &self.enemies,
        }
    }

    /// Whether an AI activation is in progress.
    #[must_use]
    pub const fn is_ai_acting(&self) -> bool {
        self.ai_acting
    }

    /// Mark the start or end of an AI activation.
    pub fn set_ai_acting(&mut self, acting: bool) {
        self.ai_acting = acting;
    }

    /// Drop units for which `is_alive` is false from both rosters.
    pub fn prune<F: Fn(UnitId) -> bool>(&mut self, is_alive: F) -> Vec<UnitId> {
        let mut removed = Vec::new();
        for roster in [&mut self.players, &mut self.enemies] {
            roster.retain(|&id| {
                let keep = is_alive(id);
                if !keep {
                    removed.push(id);
                }
                keep
            });
        }
        removed
    }

    /// Move on to the next living unit.
    ///
    /// Prunes the rosters, then checks defeat before victory, then walks the
    /// current order. When the order is used up the round counter increments
    /// and a fresh order is built from the pruned rosters. Does nothing once
    /// the match is over.
    pub fn advance<F: Fn(UnitId) -> bool>(&mut self, is_alive: F) -> Advance {
        if let TurnState::GameOver(result) = self.state {
            return Advance {
                removed: Vec::new(),
                step: TurnStep::Ended(result),
            };
        }

        self.ai_acting = false;
        let removed = self.prune(&is_alive);

        if self.players.is_empty() {
            return self.finish(removed, MatchResult::Defeat);
        }
        if self.enemies.is_empty() {
            return self.finish(removed, MatchResult::Victory);
        }

        let mut round_started = None;
        loop {
            if self.next >= self.order.len() {
                if self.round_limit.is_some_and(|limit| self.round >= limit) {
                    return self.finish(removed, MatchResult::Draw);
                }
                self.round += 1;
                self.order = build_turn_order(&self.players, &self.enemies);
                self.next = 0;
                round_started = Some(self.round);
                tracing::debug!(round = self.round, units = self.order.len(), "Turn order rebuilt");
            }

            let candidate = self.order[self.next];
            self.next += 1;
            if is_alive(candidate) {
                self.state = TurnState::UnitActive(candidate);
                return Advance {
                    removed,
                    step: TurnStep::Activated {
                        unit: candidate,
                        round_started,
                    },
                };
            }
        }
    }

    fn finish(&mut self, removed: Vec<UnitId>, result: MatchResult) -> Advance {
        self.state = TurnState::GameOver(result);
        self.ai_acting = false;
        Advance {
            removed,
            step: TurnStep::Ended(result),
        }
    }
}
