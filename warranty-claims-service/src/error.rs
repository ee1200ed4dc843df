use graph_flow::GraphError;
use thiserror::Error;

use crate::models::StageName;

/// Errors that abort a batch run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Claim {index} failed: {source}")]
    ClaimFailed {
        /// 1-based position of the claim in the batch
        index: usize,
        #[source]
        source: GraphError,
    },

    #[error("Claim {index} finished without a decision")]
    MissingDecision { index: usize },
}

impl PipelineError {
    /// Stage whose failure aborted the batch, if known
    pub fn stage(&self) -> Option<StageName> {
        match self {
            PipelineError::ClaimFailed { source, .. } => {
                source.task_id().and_then(StageName::from_task_id)
            }
            PipelineError::MissingDecision { .. } => None,
        }
    }
}
