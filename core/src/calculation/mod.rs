//! Calculation engine seam.
//!
//! RULE: The processor never computes LGD or PD numbers itself.
//! Everything numeric goes through a CalculationEngine, which may fail
//! for any scenario without affecting the others.
//!
//! Inputs are passed by value. The engine owns its copy of the age
//! analysis and may reorder or mutate it freely.

mod baseline;

pub use baseline::BaselineEngine;

use crate::{
    model::{AgedTransaction, DefaultTrackingApproach, EadCalculationApproach, ScoringTableItem, ScoringType, TermStructureItem},
    types::{Matrix, Rating},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LgdInput {
    pub interest_rate: f64,
    pub age_analysis: Vec<AgedTransaction>,
    pub defaults_rating: Rating,
    pub scoring_table: Vec<ScoringTableItem>,
    pub scoring_type: ScoringType,
    pub track_default_events: DefaultTrackingApproach,
    pub absorbing_states: u32,
    pub ead_calculation_approach: EadCalculationApproach,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LgdOutput {
    pub term_structure: Vec<TermStructureItem>,
    pub weighted_term_structure: Vec<TermStructureItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdInput {
    pub age_analysis: Vec<AgedTransaction>,
    pub absorbing_states: u32,
    pub data_frequency_scalar: f64,
    pub max_rating: Rating,
    pub scoring_table: Vec<ScoringTableItem>,
    pub scoring_type: ScoringType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatrixOutput {
    pub cohort_matrix: Matrix,
    pub migration_matrix: Matrix,
}

pub trait CalculationEngine {
    fn calculate_lgd_term_structure(&self, input: LgdInput) -> Result<LgdOutput, CalculationError>;

    fn calculate_all_matrices(&self, input: PdInput) -> Result<MatrixOutput, CalculationError>;
}

/// Rating a transaction falls into under the given table, if any.
///
/// Ageing buckets exclude their lower bound and include their upper bound.
/// Status tables match on the status label, internal score tables on the
/// score label.
pub fn rate_transaction(
    txn: &AgedTransaction,
    table: &[ScoringTableItem],
    scoring_type: ScoringType,
) -> Option<Rating> {
    let label = match scoring_type {
        ScoringType::Ageing => None,
        ScoringType::Status => Some(txn.status.as_deref()?),
        ScoringType::InternalScore => Some(txn.score.as_deref()?),
    };

    table.iter().find_map(|item| match (item, label) {
        (ScoringTableItem::Ageing { min_days, max_days, rating }, None) => {
            let days = txn.ageing? as f64;
            let above_min = min_days.map_or(true, |min| days > min);
            let below_max = max_days.map_or(true, |max| days <= max);
            (above_min && below_max).then_some(*rating)
        }
        (ScoringTableItem::Categorical { rating, contains }, Some(label)) => {
            contains.iter().any(|c| c == label).then_some(*rating)
        }
        _ => None,
    })
}
