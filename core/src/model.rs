//! Records loaded from the data store for one hazard rate run.
//!
//! All of these are read-only inputs once loaded. Scenario processing
//! clones what it hands to the calculation engine.

use crate::{status::RunStatus, types::{Rating, RunId}};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: RunId,
    pub title: String,
    pub run_date: Option<NaiveDate>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub organisation_id: Option<String>,
    pub status: RunStatus,
}

/// How exposure at default is measured for the LGD calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EadCalculationApproach {
    OutstandingBalance,
    TransactionAmount,
    CreditLimit,
}

impl EadCalculationApproach {
    pub fn code(&self) -> i64 {
        match self {
            EadCalculationApproach::OutstandingBalance => 0,
            EadCalculationApproach::TransactionAmount  => 1,
            EadCalculationApproach::CreditLimit        => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EadCalculationApproach::OutstandingBalance),
            1 => Some(EadCalculationApproach::TransactionAmount),
            2 => Some(EadCalculationApproach::CreditLimit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunParameters {
    #[serde(default)]
    pub category1: Option<String>,
    #[serde(default)]
    pub category2: Option<String>,
    #[serde(default)]
    pub category3: Option<String>,
    pub lgd_run_date: Option<NaiveDate>,
    pub lgd_min_date: NaiveDate,
    pub lgd_max_date: NaiveDate,
    pub lgd_interest_rate: f64,
    pub hazard_pd_run_date: Option<NaiveDate>,
    pub hazard_pd_min_date: NaiveDate,
    pub hazard_pd_max_date: NaiveDate,
    pub cohort_pd_run_date: Option<NaiveDate>,
    pub cohort_pd_min_date: NaiveDate,
    pub cohort_pd_max_date: NaiveDate,
    pub cohort_pd_outcome_period: f64,
    pub ead_calculation_approach: EadCalculationApproach,
}

impl RunParameters {
    /// Widest date range any calculation in the run needs.
    /// Transactions are fetched once over this window.
    pub fn fetch_window(&self) -> (NaiveDate, NaiveDate) {
        (
            self.hazard_pd_min_date.min(self.lgd_min_date),
            self.hazard_pd_max_date.max(self.lgd_max_date),
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandType {
    Day,
    Status,
    InternalScore,
}

impl BandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandType::Day           => "DAY",
            BandType::Status        => "STATUS",
            BandType::InternalScore => "INTERNAL_SCORE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DAY"            => Some(BandType::Day),
            "STATUS"         => Some(BandType::Status),
            "INTERNAL_SCORE" => Some(BandType::InternalScore),
            _ => None,
        }
    }
}

/// One boundary (DAY) or bucket (STATUS, INTERNAL_SCORE) of a banding scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBandItem {
    pub id: String,
    #[serde(rename = "type")]
    pub band_type: BandType,
    pub position: i64,
    pub value: String,
}

/// Number of trailing buckets per scheme treated as terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AbsorbingStates {
    pub days_absorbing_state: u32,
    pub status_absorbing_state: u32,
    pub internal_score_absorbing_state: u32,
}

impl AbsorbingStates {
    pub fn for_scoring_type(&self, scoring_type: ScoringType) -> u32 {
        match scoring_type {
            ScoringType::Ageing        => self.days_absorbing_state,
            ScoringType::Status        => self.status_absorbing_state,
            ScoringType::InternalScore => self.internal_score_absorbing_state,
        }
    }
}

/// One receivable snapshot from the age analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgedTransaction {
    pub id: String,
    pub transaction_number: String,
    #[serde(rename = "type", default)]
    pub txn_type: Option<i64>,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub ageing: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub limit: Option<f64>,
    pub category1: String,
}

impl AgedTransaction {
    pub fn within(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.date >= from && self.date <= to
    }
}

/// A distinct category triple observed in a run's age analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CategoryData {
    pub category1: String,
    pub category2: Option<String>,
    pub category3: Option<String>,
}

/// Which attribute of a transaction the scoring table rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoringType {
    Ageing,
    Status,
    InternalScore,
}

impl ScoringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringType::Ageing        => "ageing",
            ScoringType::Status        => "status",
            ScoringType::InternalScore => "internal_score",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ageing"         => Some(ScoringType::Ageing),
            "status"         => Some(ScoringType::Status),
            "internal_score" => Some(ScoringType::InternalScore),
            _ => None,
        }
    }
}

/// How default events are tracked when building the LGD term structure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DefaultTrackingApproach {
    Lifetime,
    LifetimeSingle,
    LifetimeMultiple,
    TwelveMonthSingle,
}

impl DefaultTrackingApproach {
    /// Stored in `hazard_rate_scenario.lgd_approach`.
    pub fn code(&self) -> i64 {
        match self {
            DefaultTrackingApproach::Lifetime          => 0,
            DefaultTrackingApproach::LifetimeSingle    => 1,
            DefaultTrackingApproach::LifetimeMultiple  => 2,
            DefaultTrackingApproach::TwelveMonthSingle => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DefaultTrackingApproach::Lifetime),
            1 => Some(DefaultTrackingApproach::LifetimeSingle),
            2 => Some(DefaultTrackingApproach::LifetimeMultiple),
            3 => Some(DefaultTrackingApproach::TwelveMonthSingle),
            _ => None,
        }
    }
}

/// One bucket of a scoring table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScoringTableItem {
    Ageing {
        min_days: Option<f64>,
        max_days: Option<f64>,
        rating: Rating,
    },
    Categorical {
        rating: Rating,
        contains: Vec<String>,
    },
}

impl ScoringTableItem {
    pub fn rating(&self) -> Rating {
        match self {
            ScoringTableItem::Ageing { rating, .. }
            | ScoringTableItem::Categorical { rating, .. } => *rating,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TermStructureItem {
    pub term: u32,
    pub value: f64,
}
