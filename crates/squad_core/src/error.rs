//! Error types for match setup and data loading.
//!
//! Gameplay operations (moving, firing, reloading) never fail with an error:
//! they report an outcome value instead. `TacticsError` only covers problems
//! with the inputs a match is built from.

use thiserror::Error;

use crate::grid::GridCoord;

/// Result type alias using [`TacticsError`].
pub type Result<T> = std::result::Result<T, TacticsError>;

/// Top-level error type for setup and data errors.
#[derive(Debug, Error)]
pub enum TacticsError {
    /// A roster entry referenced a character class that is not registered.
    #[error("Unknown character class: {0}")]
    UnknownClass(String),

    /// A unit could not be placed on its spawn tile.
    #[error("Cannot place unit '{unit}' at {coord}: {reason}")]
    InvalidPlacement {
        /// Name of the unit being placed.
        unit: String,
        /// Requested tile.
        coord: GridCoord,
        /// Why the tile was refused.
        reason: String,
    },

    /// A map layout could not be turned into a grid.
    #[error("Invalid map layout: {0}")]
    InvalidLayout(String),

    /// Data file parsing error.
    #[error("Failed to parse {what}: {message}")]
    DataParseError {
        /// What was being parsed (e.g. "class table").
        what: String,
        /// Error message.
        message: String,
    },

    /// Invalid match state.
    #[error("Invalid match state: {0}")]
    InvalidState(String),
}
