//! Run definition files.
//!
//! A run definition is the full input set for one hazard rate run, as JSON:
//! the run row, its parameters, score bands, absorbing states and the aged
//! transaction population. The runner imports it into the store before
//! calculating.

use crate::{
    model::{AbsorbingStates, AgedTransaction, BandType, EadCalculationApproach, Run, RunParameters, ScoreBandItem},
    status::RunStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An aged transaction as supplied in a run file. The lower category
/// levels only feed the category hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgedTransactionRecord {
    #[serde(flatten)]
    pub transaction: AgedTransaction,
    #[serde(default)]
    pub category2: Option<String>,
    #[serde(default)]
    pub category3: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDefinition {
    pub run: Run,
    pub parameters: RunParameters,
    pub score_bands: Vec<ScoreBandItem>,
    pub absorbing_states: AbsorbingStates,
    #[serde(default)]
    pub transactions: Vec<AgedTransactionRecord>,
}

impl RunDefinition {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let definition: RunDefinition = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid run definition {path}: {e}"))?;
        Ok(definition)
    }

    /// Minimal run used in tests: one DAY band set [30, 60], no category
    /// split beyond "Retail", days absorbing state 1, and a handful of
    /// snapshots across two transactions.
    pub fn default_test(run_id: &str) -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        let snapshot = |number: &str, month: u32, ageing: i64, balance: f64| AgedTransactionRecord {
            transaction: AgedTransaction {
                id: format!("{run_id}-{number}-{month}"),
                transaction_number: number.to_string(),
                txn_type: Some(1),
                date: date(2023, month, 28),
                amount: 1_000.0,
                balance: Some(balance),
                ageing: Some(ageing),
                status: None,
                score: None,
                limit: Some(2_000.0),
                category1: "Retail".to_string(),
            },
            category2: None,
            category3: None,
        };

        Self {
            run: Run {
                id: run_id.to_string(),
                title: "Test hazard rate run".to_string(),
                run_date: Some(date(2024, 1, 15)),
                contact_email: None,
                description: None,
                user_id: None,
                organisation_id: None,
                status: RunStatus::Queued,
            },
            parameters: RunParameters {
                category1: None,
                category2: None,
                category3: None,
                lgd_run_date: None,
                lgd_min_date: date(2023, 1, 1),
                lgd_max_date: date(2023, 12, 31),
                lgd_interest_rate: 0.12,
                hazard_pd_run_date: None,
                hazard_pd_min_date: date(2023, 1, 1),
                hazard_pd_max_date: date(2023, 12, 31),
                cohort_pd_run_date: None,
                cohort_pd_min_date: date(2023, 1, 1),
                cohort_pd_max_date: date(2023, 12, 31),
                cohort_pd_outcome_period: 12.0,
                ead_calculation_approach: EadCalculationApproach::OutstandingBalance,
            },
            score_bands: vec![
                ScoreBandItem {
                    id: format!("{run_id}-day-60"),
                    band_type: BandType::Day,
                    position: 1,
                    value: "60".to_string(),
                },
                ScoreBandItem {
                    id: format!("{run_id}-day-30"),
                    band_type: BandType::Day,
                    position: 0,
                    value: "30".to_string(),
                },
            ],
            absorbing_states: AbsorbingStates {
                days_absorbing_state: 1,
                status_absorbing_state: 0,
                internal_score_absorbing_state: 0,
            },
            transactions: vec![
                snapshot("INV-1", 1, 10, 1_000.0),
                snapshot("INV-1", 2, 40, 1_000.0),
                snapshot("INV-1", 3, 70, 1_000.0),
                snapshot("INV-1", 4, 100, 600.0),
                snapshot("INV-1", 5, 130, 500.0),
                snapshot("INV-2", 1, 5, 800.0),
                snapshot("INV-2", 2, 20, 800.0),
                snapshot("INV-2", 3, 45, 700.0),
            ],
        }
    }
}
