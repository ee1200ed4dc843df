pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod policy;
pub mod reasoning;
pub mod tasks;
pub mod workflow;

pub use config::{ConfigError, LlmConfig, LlmProvider, ServiceConfig};
pub use error::PipelineError;
pub use models::*;
pub use policy::{PolicyDocument, PolicySource};
pub use reasoning::{ReasoningClient, ReasoningError, ReasoningResponse, RigReasoningClient};
pub use workflow::{
    BatchSummary, ClaimPipeline, FailurePolicy, LogProgress, NoopProgress, ProgressObserver,
    build_claim_workflow,
};
