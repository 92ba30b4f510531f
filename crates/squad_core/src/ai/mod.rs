//! Enemy decision policy.
//!
//! - [`weights`] - per-unit action weights and their normalisation
//! - [`policy`] - the weighted action draw and tile scoring
//!
//! The activation loop itself is implemented on
//! [`TacticsSim`](crate::simulation::TacticsSim).

mod driver;
pub mod policy;
pub mod weights;

pub use policy::{
    best_approach_tile, best_cover_tile, choose_action, nearest_opponent, random_walk, EnemyAction,
};
pub use weights::AiWeights;
