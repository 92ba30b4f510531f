//! Data structures for match configuration.
//!
//! This module contains pure data structures that define character classes
//! and rule constants. All structs are designed to be deserialized from RON.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `squad_headless`.

mod class_data;
mod rules_data;

pub use class_data::{CharacterClass, ClassRegistry};
pub use rules_data::RulesConfig;
