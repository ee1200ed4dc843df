use async_trait::async_trait;
use graph_flow::{NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{ClaimState, Decision, StageName, TraceEntry};
use crate::parsing::{DecisionParser, FallbackRules, ParsedDecision};
use crate::policy::PolicyDocument;
use crate::reasoning::ReasoningClient;

use super::types::{NOT_COVERED_BY_POLICY, OnFailure, RULE_BASED_FALLBACK_PROMPT};
use super::utils::{ask, handle_failure};

fn build_prompt(policy: &str, state: &ClaimState) -> String {
    let approve = Decision::Approve.label();
    let reject = Decision::Reject.label();
    let escalate = Decision::Escalate.label();

    format!(
        r#"You are a warranty adjudicator. Given the following information about a warranty claim, choose one of three actions: "{approve}", "{reject}", or "{escalate}" (human-in-the-loop for manual review).

Provide your answer as a single decision on the first line, and then a short (1-2 sentence) justification on the following line.

Policy manual (for reference):
{policy}

Claim details: {details}

Policy check result: {policy_check}
Fraud score (0-1): {fraud_score}
Evidence / red flags found: {evidence}

Important: If the policy_check indicates the claim is "{NOT_COVERED_BY_POLICY}" or the evidence highlights a direct policy violation (e.g., part not covered), prefer "{reject}" unless strong justification exists to approve. If the evidence is ambiguous, but fraud score is moderately high (>0.5), choose "{escalate}"."#,
        details = state.claim.details(),
        policy_check = state.policy_check,
        fraud_score = state.fraud_score,
        evidence = state.evidence,
    )
}

/// Final adjudication. The reasoning step is asked first; when its call fails
/// or its first line names no decision, [`FallbackRules`] decide instead.
/// Either way exactly one trace entry is recorded.
pub struct DecisionTask {
    policy: PolicyDocument,
    reasoning: Arc<dyn ReasoningClient>,
    parser: DecisionParser,
    fallback: FallbackRules,
    on_failure: OnFailure,
}

impl DecisionTask {
    pub const ON_FAILURE: OnFailure = OnFailure::Recover;

    pub fn new(policy: PolicyDocument, reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self {
            policy,
            reasoning,
            parser: DecisionParser::default(),
            fallback: FallbackRules::default(),
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

    pub fn with_parser(mut self, parser: DecisionParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackRules) -> Self {
        self.fallback = fallback;
        self
    }
}

#[async_trait]
impl Task<ClaimState> for DecisionTask {
    fn id(&self) -> &str {
        StageName::Decision.as_str()
    }

    async fn run(&self, state: ClaimState) -> Result<TaskResult<ClaimState>> {
        let prompt = build_prompt(self.policy.text(), &state);

        let reply = ask(self.reasoning.as_ref(), StageName::Decision, &prompt).await;
        let parsed = match handle_failure(self.on_failure, StageName::Decision, reply)? {
            Some(response) => match self.parser.parse(&response) {
                ParsedDecision::Matched(decision) => Some((decision, response)),
                ParsedDecision::Unparsed => {
                    warn!(stage = %StageName::Decision, response = %response, "Decision reply not recognised");
                    None
                }
            },
            None => None,
        };

        let (decision, entry) = match parsed {
            Some((decision, response)) => (
                decision,
                TraceEntry::new(StageName::Decision, prompt, response),
            ),
            None => {
                let decision = self.fallback.decide(&state.policy_check, state.fraud_score);
                info!(stage = %StageName::Decision, decision = %decision, "Using rule-based fallback");
                (
                    decision,
                    TraceEntry::new(StageName::Decision, RULE_BASED_FALLBACK_PROMPT, decision.label()),
                )
            }
        };

        info!(stage = %StageName::Decision, decision = %decision, "Decision complete");

        let state = ClaimState {
            decision: Some(decision),
            ..state
        }
        .record(entry);

        Ok(TaskResult::new_with_status(
            state,
            NextAction::End,
            Some(format!("Claim adjudicated: {decision}")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Claim;

    #[test]
    fn test_prompt_lists_labels_and_prior_outputs() {
        let mut state = ClaimState::new(Claim::default());
        state.policy_check = "Covered by policy".into();
        state.fraud_score = 0.7;
        state.evidence = "Odometer rollback suspected".into();

        let prompt = build_prompt("manual", &state);

        assert!(prompt.contains(r#""Approve claim", "Reject claim", or "Escalate to HITL""#));
        assert!(prompt.contains("Policy check result: Covered by policy"));
        assert!(prompt.contains("Fraud score (0-1): 0.7"));
        assert!(prompt.contains("Evidence / red flags found: Odometer rollback suspected"));
    }
}
