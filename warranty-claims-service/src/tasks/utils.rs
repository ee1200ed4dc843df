use graph_flow::GraphError;
use tracing::{debug, warn};

use crate::models::StageName;
use crate::reasoning::{ReasoningClient, ReasoningError};

use super::types::OnFailure;

/// Send `prompt` to the reasoning step and return the trimmed reply
pub async fn ask(
    reasoning: &dyn ReasoningClient,
    stage: StageName,
    prompt: &str,
) -> Result<String, ReasoningError> {
    let response = reasoning.invoke(prompt).await?;
    let text = response.content.trim().to_string();
    debug!(stage = %stage, response = %text, "Reasoning reply received");
    Ok(text)
}

/// Map a reasoning failure onto the failing task
pub fn stage_failed(stage: StageName, error: ReasoningError) -> GraphError {
    GraphError::task_failed(stage.as_str(), error)
}

/// Apply a stage's failure policy to its reasoning call.
/// `Ok(None)` means the call failed and the stage recovers on its own.
pub fn handle_failure(
    on_failure: OnFailure,
    stage: StageName,
    reply: Result<String, ReasoningError>,
) -> graph_flow::Result<Option<String>> {
    match (reply, on_failure) {
        (Ok(text), _) => Ok(Some(text)),
        (Err(e), OnFailure::Propagate) => Err(stage_failed(stage, e)),
        (Err(e), OnFailure::Recover) => {
            warn!(stage = %stage, error = %e, "Reasoning call failed, recovering");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_failure_follows_policy() {
        let ok = handle_failure(OnFailure::Propagate, StageName::PolicyCheck, Ok("yes".into()));
        assert_eq!(ok.unwrap(), Some("yes".to_string()));

        let recovered = handle_failure(
            OnFailure::Recover,
            StageName::PolicyCheck,
            Err(ReasoningError::Call("down".into())),
        );
        assert_eq!(recovered.unwrap(), None);

        let err = handle_failure(
            OnFailure::Propagate,
            StageName::FraudScoring,
            Err(ReasoningError::Call("down".into())),
        )
        .unwrap_err();
        assert_eq!(err.task_id(), Some("fraud_scoring_agent"));
    }
}
