//! Score band classification.
//!
//! Raw band rows arrive unordered and mixed across schemes. Day bands are
//! boundaries and sort ascending by their numeric value. Status and internal
//! score bands are label groups and sort ascending by position. Both sorts
//! are stable, so rows that tie keep their store order.

use crate::{
    error::{HazardError, HazardResult},
    model::{BandType, ScoreBandItem},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBands {
    /// Ageing boundaries in days, ascending. Fractional values are kept.
    pub day_boundaries: Vec<f64>,
    pub status: Vec<ScoreBandItem>,
    pub internal_score: Vec<ScoreBandItem>,
}

impl ScoreBands {
    pub fn classify(items: Vec<ScoreBandItem>) -> HazardResult<Self> {
        let mut days = Vec::new();
        let mut status = Vec::new();
        let mut internal_score = Vec::new();

        for item in items {
            match item.band_type {
                BandType::Day => {
                    let boundary = parse_day_boundary(&item)?;
                    days.push(boundary);
                }
                BandType::Status => status.push(item),
                BandType::InternalScore => internal_score.push(item),
            }
        }

        days.sort_by(|a, b| a.total_cmp(b));
        status.sort_by_key(|item| item.position);
        internal_score.sort_by_key(|item| item.position);

        Ok(Self { day_boundaries: days, status, internal_score })
    }

    pub fn is_empty(&self) -> bool {
        self.day_boundaries.is_empty() && self.status.is_empty() && self.internal_score.is_empty()
    }
}

fn parse_day_boundary(item: &ScoreBandItem) -> HazardResult<f64> {
    item.value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|days| days.is_finite())
        .ok_or_else(|| HazardError::InvalidScoreBand {
            id: item.id.clone(),
            value: item.value.clone(),
        })
}
