//! Scenario generation.
//!
//! ORDER (fixed, persisted in this order):
//!   1. Banding scheme: day, then status, then internal score
//!   2. No category filter, then each distinct category1
//!   3. Default-tracking approach, in SCENARIO_APPROACHES order
//!
//! Each scenario owns its own copy of the scheme's scoring table.

use crate::{
    category::CategoryHierarchy,
    matrix::MigrationRow,
    model::{DefaultTrackingApproach, ScoreBandItem, ScoringTableItem, ScoringType, TermStructureItem},
    score_band::ScoreBands,
    types::{Rating, RunId, ScenarioId},
};
use serde::{Deserialize, Serialize};

/// Approaches every scheme/category pair is calculated under.
/// LifetimeMultiple is not part of a standard run.
pub const SCENARIO_APPROACHES: [DefaultTrackingApproach; 3] = [
    DefaultTrackingApproach::Lifetime,
    DefaultTrackingApproach::LifetimeSingle,
    DefaultTrackingApproach::TwelveMonthSingle,
];

/// Delimiter between raw labels inside one status/internal score band.
pub const LABEL_DELIMITER: &str = "(_)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub id: Option<ScenarioId>,
    pub run_id: Option<RunId>,
    pub scoring_type: ScoringType,
    pub category1: Option<String>,
    pub scoring_table: Vec<ScoringTableItem>,
    pub lgd_approach: DefaultTrackingApproach,

    pub term_structure: Vec<TermStructureItem>,
    pub weighted_term_structure: Vec<TermStructureItem>,
    pub cohort_migration_matrix: Vec<MigrationRow>,
    pub hazard_rate_migration_matrix: Vec<MigrationRow>,
    pub error: Option<String>,
}

impl Scenario {
    pub fn new(
        scoring_type: ScoringType,
        category1: Option<String>,
        scoring_table: Vec<ScoringTableItem>,
        lgd_approach: DefaultTrackingApproach,
    ) -> Self {
        Self {
            id: None,
            run_id: None,
            scoring_type,
            category1,
            scoring_table,
            lgd_approach,
            term_structure: Vec::new(),
            weighted_term_structure: Vec::new(),
            cohort_migration_matrix: Vec::new(),
            hazard_rate_migration_matrix: Vec::new(),
            error: None,
        }
    }

    /// Rating of the last bucket in the scoring table.
    pub fn last_rating(&self) -> Rating {
        self.scoring_table.last().map(ScoringTableItem::rating).unwrap_or(0)
    }
}

/// Ageing table from ascending day boundaries.
///
/// n boundaries give n + 1 buckets: an open-below first bucket, then one
/// bucket starting at each boundary. The last bucket is open-above.
pub fn ageing_scoring_table(boundaries: &[f64]) -> Vec<ScoringTableItem> {
    let Some(&first) = boundaries.first() else {
        return Vec::new();
    };

    let mut table = Vec::with_capacity(boundaries.len() + 1);
    table.push(ScoringTableItem::Ageing { min_days: None, max_days: Some(first), rating: 1 });
    for (i, &boundary) in boundaries.iter().enumerate() {
        table.push(ScoringTableItem::Ageing {
            min_days: Some(boundary),
            max_days: boundaries.get(i + 1).copied(),
            rating: (i + 2) as Rating,
        });
    }
    table
}

/// Status or internal score table. Each band becomes one bucket holding
/// the raw labels it groups.
pub fn categorical_scoring_table(bands: &[ScoreBandItem]) -> Vec<ScoringTableItem> {
    bands
        .iter()
        .enumerate()
        .map(|(i, band)| ScoringTableItem::Categorical {
            rating: (i + 1) as Rating,
            contains: band.value.split(LABEL_DELIMITER).map(String::from).collect(),
        })
        .collect()
}

pub fn generate_scenarios(
    bands: &ScoreBands,
    categories: &CategoryHierarchy,
    approaches: &[DefaultTrackingApproach],
) -> Vec<Scenario> {
    let schemes = [
        (ScoringType::Ageing, ageing_scoring_table(&bands.day_boundaries)),
        (ScoringType::Status, categorical_scoring_table(&bands.status)),
        (ScoringType::InternalScore, categorical_scoring_table(&bands.internal_score)),
    ];

    let filters: Vec<Option<&String>> = std::iter::once(None)
        .chain(categories.category1.iter().map(Some))
        .collect();

    let mut scenarios = Vec::new();
    for (scoring_type, table) in schemes {
        if table.is_empty() {
            continue;
        }
        for filter in &filters {
            for &approach in approaches {
                scenarios.push(Scenario::new(
                    scoring_type,
                    filter.cloned(),
                    table.clone(),
                    approach,
                ));
            }
        }
    }

    log::debug!("Generated {} scenarios from {} category filters", scenarios.len(), filters.len());
    scenarios
}
