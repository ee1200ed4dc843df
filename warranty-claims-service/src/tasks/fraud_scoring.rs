use async_trait::async_trait;
use graph_flow::{NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{Claim, ClaimState, StageName, TraceEntry};
use crate::parsing::parse_fraud_score;
use crate::policy::PolicyDocument;
use crate::reasoning::ReasoningClient;

use super::types::{NEUTRAL_FRAUD_SCORE, OnFailure, RECOVERED_REPLY};
use super::utils::{ask, handle_failure};

fn build_prompt(policy: &str, claim: &Claim, policy_check: &str) -> String {
    format!(
        r#"You are a fraud detection expert.
Policy manual:
{policy}

Claim details:
{details}
Policy validation: {policy_check}

Analyze whether this claim looks fraudulent.
Return ONLY a number between 0 and 1 (fraud likelihood score)."#,
        details = claim.details(),
    )
}

/// Scores fraud likelihood. An unusable reply is not an error: the score
/// becomes [`NEUTRAL_FRAUD_SCORE`] and the raw reply stays in the trace.
pub struct FraudScoringTask {
    policy: PolicyDocument,
    reasoning: Arc<dyn ReasoningClient>,
    on_failure: OnFailure,
}

impl FraudScoringTask {
    pub const ON_FAILURE: OnFailure = OnFailure::Propagate;

    pub fn new(policy: PolicyDocument, reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self {
            policy,
            reasoning,
            on_failure: Self::ON_FAILURE,
        }
    }

    pub fn with_on_failure(mut self, on_failure: OnFailure) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn on_failure(&self) -> OnFailure {
        self.on_failure
    }
}

#[async_trait]
impl Task<ClaimState> for FraudScoringTask {
    fn id(&self) -> &str {
        StageName::FraudScoring.as_str()
    }

    async fn run(&self, state: ClaimState) -> Result<TaskResult<ClaimState>> {
        let prompt = build_prompt(self.policy.text(), &state.claim, &state.policy_check);

        let reply = ask(self.reasoning.as_ref(), StageName::FraudScoring, &prompt).await;
        let response = handle_failure(self.on_failure, StageName::FraudScoring, reply)?
            .unwrap_or_else(|| RECOVERED_REPLY.to_string());

        let fraud_score = parse_fraud_score(&response).unwrap_or_else(|| {
            warn!(
                stage = %StageName::FraudScoring,
                response = %response,
                "Fraud score reply is not a number in [0, 1], using neutral score"
            );
            NEUTRAL_FRAUD_SCORE
        });

        info!(stage = %StageName::FraudScoring, fraud_score, "Fraud scoring complete");

        let state = ClaimState {
            fraud_score,
            ..state
        }
        .record(TraceEntry::new(StageName::FraudScoring, prompt, response));

        Ok(TaskResult::new(state, NextAction::Continue))
    }
}
