use crate::model::ScoringType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HazardError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hazard rate run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error("Hazard rate run '{run_id}' has no {what}")]
    MissingRunData { run_id: String, what: &'static str },

    #[error("Score band '{id}' has a non-numeric day boundary: {value:?}")]
    InvalidScoreBand { id: String, value: String },

    #[error("No default bucket for {scoring_type:?} scoring: absorbing state {absorbing_state} with {buckets} buckets")]
    NoDefaultBucket { scoring_type: ScoringType, absorbing_state: u32, buckets: usize },

    #[error("Failed loading run data: {0}")]
    DataLoad(Box<HazardError>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HazardError {
    /// True when the run failed while its inputs were still being loaded.
    pub fn is_data_load(&self) -> bool {
        matches!(self, HazardError::DataLoad(_))
    }
}

pub type HazardResult<T> = Result<T, HazardError>;
