//! Shared primitive types used across the calculator.

/// The canonical hazard rate run identifier.
pub type RunId = String;

/// Generated identity of a persisted scenario.
pub type ScenarioId = String;

/// A discrete rating bucket. Ratings start at 1.
pub type Rating = u32;

/// A square state-to-state matrix, row-major.
pub type Matrix = Vec<Vec<f64>>;
