//! Hazard rate run lifecycle.
//!
//! Full lifecycle:
//!   NEW → AGING → AGED → QUEUED → QUEUE_ERROR | CALCULATING → CALCULATED
//!       → IMPORTING → IMPORTED → PUBLISHED | ERROR
//!
//! The calculator only drives CALCULATING, CALCULATED, AGED and QUEUE_ERROR.
//! The rest are written by upstream ageing and downstream import stages.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    New,
    Aging,
    Aged,
    Queued,
    QueueError,
    Calculating,
    Calculated,
    Importing,
    Imported,
    Published,
    Error,
}

impl RunStatus {
    pub const ALL: [RunStatus; 11] = [
        RunStatus::New,
        RunStatus::Aging,
        RunStatus::Aged,
        RunStatus::Queued,
        RunStatus::QueueError,
        RunStatus::Calculating,
        RunStatus::Calculated,
        RunStatus::Importing,
        RunStatus::Imported,
        RunStatus::Published,
        RunStatus::Error,
    ];

    /// Column value stored in `hazard_rate_run.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::New         => "NEW",
            RunStatus::Aging       => "AGING",
            RunStatus::Aged        => "AGED",
            RunStatus::Queued      => "QUEUED",
            RunStatus::QueueError  => "QUEUE_ERROR",
            RunStatus::Calculating => "CALCULATING",
            RunStatus::Calculated  => "CALCULATED",
            RunStatus::Importing   => "IMPORTING",
            RunStatus::Imported    => "IMPORTED",
            RunStatus::Published   => "PUBLISHED",
            RunStatus::Error       => "ERROR",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown hazard rate run status: {s}"))
    }
}
