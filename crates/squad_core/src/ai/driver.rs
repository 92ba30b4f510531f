//! The AI activation loop.

use crate::combat::ShotRequest;
use crate::pathfinding::{find_path, truncate_path};
use crate::simulation::TacticsSim;
use crate::unit::UnitId;

use super::policy::{
    best_approach_tile, best_cover_tile, choose_action, nearest_opponent, random_walk,
    EnemyAction,
};

/// Whether the activation loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl TacticsSim {
    /// Play the active unit `id` with the decision policy.
    ///
    /// Runs until the unit is out of AP or dead, no opponent is left, the
    /// policy passes, or the per-activation action cap is hit.
    pub(crate) fn run_ai_activation(&mut self, id: UnitId) {
        self.turns.set_ai_acting(true);
        let cap = self.rules.max_ai_actions_per_turn;
        let mut actions = 0;

        while let Some(unit) = self.units.get(&id) {
            if unit.is_dead() || unit.ap == 0 {
                break;
            }
            if !self.side_has_living(unit.side.opponent()) {
                break;
            }
            if actions >= cap {
                tracing::debug!(unit = %id, actions, "AI action cap reached, passing");
                self.pass(id);
                break;
            }
            actions += 1;

            if self.take_ai_action(id) == Flow::Stop {
                break;
            }
        }

        self.turns.set_ai_acting(false);
    }

    fn pass(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.ap = 0;
        }
    }

    fn take_ai_action(&mut self, id: UnitId) -> Flow {
        let Some(unit) = self.units.get(&id) else {
            return Flow::Stop;
        };

        if unit.ammo == 0 {
            return if self.reload_unit(id) {
                Flow::Continue
            } else {
                tracing::debug!(unit = %id, "AI cannot reload, passing");
                Flow::Stop
            };
        }

        let pos = unit.grid_pos;
        let ap = unit.ap;
        let class = std::sync::Arc::clone(&unit.class);
        let weights = unit.ai_weights.unwrap_or_default();

        let fire_cost = self.rules.fire_ap_cost;
        let fire_range = self.rules.max_fire_range;

        let target = nearest_opponent(
            pos,
            self.turns
                .roster(unit.side.opponent())
                .iter()
                .filter_map(|t| self.units.get(t)),
        )
        .map(|t| (t.id, t.grid_pos));

        let can_shoot = target.is_some_and(|(_, at)| pos.manhattan(at) <= fire_range)
            && ap >= fire_cost
            && unit.ammo > 0;

        let action = choose_action(&weights, can_shoot, self.dice.as_mut());
        tracing::debug!(unit = %id, ?action, can_shoot, ap, "AI action chosen");

        match action {
            EnemyAction::Shoot => {
                if let Some((target_id, _)) = target {
                    self.fire(id, target_id, &ShotRequest::aimed(fire_cost, fire_range));
                }
                Flow::Continue
            }
            EnemyAction::Move | EnemyAction::Cover => {
                if ap < class.move_ap_cost {
                    tracing::debug!(unit = %id, ap, "AI cannot pay for a move, passing");
                    self.pass(id);
                    return Flow::Stop;
                }

                let seek_cover = action == EnemyAction::Cover
                    && (class.can_take_cover || !self.rules.enforce_capabilities);
                let range = class.move_range;

                let path = match target {
                    Some((_, at)) => {
                        let destination = if seek_cover {
                            best_cover_tile(&self.grid, pos, at, range)
                                .or_else(|| best_approach_tile(&self.grid, pos, at, range))
                        } else {
                            best_approach_tile(&self.grid, pos, at, range)
                        };
                        destination
                            .and_then(|dest| find_path(&self.grid, pos, dest))
                            .filter(|path| path.len() > 1)
                            .map(|path| truncate_path(&path, range))
                    }
                    None => random_walk(
                        &self.grid,
                        pos,
                        range,
                        self.rules.random_walk_attempts,
                        self.dice.as_mut(),
                    ),
                };

                if let Some(path) = path {
                    self.walk_path(id, &path);
                }

                // Charged once per move action, even when nothing was walked.
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.spend_ap(class.move_ap_cost);
                }
                Flow::Continue
            }
            EnemyAction::Overwatch => {
                if self.enter_overwatch_unit(id) {
                    self.pass(id);
                }
                Flow::Continue
            }
        }
    }
}
