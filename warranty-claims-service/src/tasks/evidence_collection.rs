use async_trait::async_trait;
use graph_flow::{NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{Claim, ClaimState, StageName, TraceEntry};
use crate::policy::PolicyDocument;
use crate::reasoning::ReasoningClient;

use super::types::{NO_ISSUES, OnFailure, RECOVERED_REPLY};
use super::utils::{ask, handle_failure};

fn build_prompt(policy: &str, claim: &Claim, fraud_score: f64) -> String {
    format!(
        r#"You are tasked with collecting evidence for claim review.
Policy manual:
{policy}

Claim details:
{details}
Fraud score: {fraud_score}

Compare claim against the policy manual and fraud indicators.
List any red flags or violations found. If none, say "{NO_ISSUES}"."#,
        details = claim.details(),
    )
}

/// Collects red flags and policy violations for the claim
pub struct EvidenceCollectionTask {
    policy: PolicyDocument,
    reasoning: Arc<dyn ReasoningClient>,
    on_failure: OnFailure,
}

impl EvidenceCollectionTask {
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
impl Task<ClaimState> for EvidenceCollectionTask {
    fn id(&self) -> &str {
        StageName::EvidenceCollection.as_str()
    }

    async fn run(&self, state: ClaimState) -> Result<TaskResult<ClaimState>> {
        let prompt = build_prompt(self.policy.text(), &state.claim, state.fraud_score);

        let reply = ask(self.reasoning.as_ref(), StageName::EvidenceCollection, &prompt).await;
        let evidence = handle_failure(self.on_failure, StageName::EvidenceCollection, reply)?
            .unwrap_or_else(|| RECOVERED_REPLY.to_string());

        info!(
            stage = %StageName::EvidenceCollection,
            no_issues = evidence == NO_ISSUES,
            "Evidence collection complete"
        );

        let state = ClaimState {
            evidence: evidence.clone(),
            ..state
        }
        .record(TraceEntry::new(StageName::EvidenceCollection, prompt, evidence));

        Ok(TaskResult::new(state, NextAction::Continue))
    }
}
