//! Hazard rate run calculator.
//!
//! Expands a stored run configuration into scenarios, drives each one
//! through a calculation engine, and persists term structures and
//! migration matrices while tracking the run's status.

pub mod calculation;
pub mod category;
pub mod config;
pub mod error;
pub mod matrix;
pub mod model;
pub mod orchestrator;
pub mod processor;
pub mod scenario;
pub mod score_band;
pub mod status;
pub mod store;
pub mod trigger;
pub mod types;
