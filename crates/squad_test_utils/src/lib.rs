//! # Squad Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture builders for maps, classes and rosters
//! - Scripted dice for exact combat outcomes
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod dice;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
