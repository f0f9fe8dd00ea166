//! Queue trigger payload.
//!
//! The calculator is started by a message naming the run (`batchId`) and
//! the target whose credentials locate its database (`targetId`). Only
//! the run id is used here; credential lookup happens upstream.

use crate::{error::HazardResult, types::RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunTrigger {
    pub batch_id: RunId,
    #[serde(default)]
    pub target_id: Option<String>,
}

impl RunTrigger {
    pub fn parse(message: &str) -> HazardResult<Self> {
        Ok(serde_json::from_str(message)?)
    }

    pub fn run_id(&self) -> &str {
        &self.batch_id
    }
}
