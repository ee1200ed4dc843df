// Warranty claim adjudication stages, in execution order
pub mod policy_check;
pub mod fraud_scoring;
pub mod evidence_collection;
pub mod decision;

// Shared modules
pub mod types;
pub mod utils;

// Re-export task implementations
pub use policy_check::PolicyCheckTask;
pub use fraud_scoring::FraudScoringTask;
pub use evidence_collection::EvidenceCollectionTask;
pub use decision::DecisionTask;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyDocument, PolicySource};
    use crate::reasoning::{ReasoningClient, ReasoningError, ReasoningResponse};
    use async_trait::async_trait;
    use std::sync::Arc;
    use types::OnFailure;

    struct Unused;

    #[async_trait]
    impl ReasoningClient for Unused {
        async fn invoke(&self, _prompt: &str) -> Result<ReasoningResponse, ReasoningError> {
            Err(ReasoningError::Call("unused".into()))
        }
    }

    #[test]
    fn test_only_decision_recovers_by_default() {
        let policy = PolicyDocument::new("manual", PolicySource::Override);
        let reasoning: Arc<dyn ReasoningClient> = Arc::new(Unused);

        assert_eq!(
            PolicyCheckTask::new(policy.clone(), reasoning.clone()).on_failure(),
            OnFailure::Propagate
        );
        assert_eq!(
            FraudScoringTask::new(policy.clone(), reasoning.clone()).on_failure(),
            OnFailure::Propagate
        );
        assert_eq!(
            EvidenceCollectionTask::new(policy.clone(), reasoning.clone()).on_failure(),
            OnFailure::Propagate
        );
        assert_eq!(DecisionTask::new(policy, reasoning).on_failure(), OnFailure::Recover);
    }
}
