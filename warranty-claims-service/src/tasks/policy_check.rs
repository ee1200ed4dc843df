use async_trait::async_trait;
use graph_flow::{NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{Claim, ClaimState, StageName, TraceEntry};
use crate::policy::PolicyDocument;
use crate::reasoning::ReasoningClient;

use super::types::{
    COVERED_BY_POLICY, FOUR_WHEELER_MARKER, NOT_COVERED_BY_POLICY, OnFailure, RECOVERED_REPLY, VehicleType,
};
use super::utils::{ask, handle_failure};

/// Vehicle type from the claim's `model` column; a missing model is a two-wheeler
pub fn classify_vehicle(claim: &Claim) -> VehicleType {
    match claim.text_field("model") {
        Some(model) if model.contains(FOUR_WHEELER_MARKER) => VehicleType::FourWheeler,
        _ => VehicleType::TwoWheeler,
    }
}

fn build_prompt(policy: &str, vehicle_type: VehicleType, claim: &Claim) -> String {
    format!(
        r#"You are a warranty compliance officer.
Policy manual:
{policy}

Vehicle type: {vehicle}
Claim details: {details}

Based on warranty days, mileage, and covered parts,
is this claim covered under the policy?
Answer with: "{COVERED_BY_POLICY}" or "{NOT_COVERED_BY_POLICY}"."#,
        vehicle = vehicle_type.as_str(),
        details = claim.details(),
    )
}

/// Asks the reasoning step whether the claim is covered by the policy manual.
/// The reply is stored verbatim; interpretation happens in the decision stage.
pub struct PolicyCheckTask {
    policy: PolicyDocument,
    reasoning: Arc<dyn ReasoningClient>,
    on_failure: OnFailure,
}

impl PolicyCheckTask {
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
impl Task<ClaimState> for PolicyCheckTask {
    fn id(&self) -> &str {
        StageName::PolicyCheck.as_str()
    }

    async fn run(&self, state: ClaimState) -> Result<TaskResult<ClaimState>> {
        let vehicle_type = classify_vehicle(&state.claim);
        let prompt = build_prompt(self.policy.text(), vehicle_type, &state.claim);

        let reply = ask(self.reasoning.as_ref(), StageName::PolicyCheck, &prompt).await;
        let response = handle_failure(self.on_failure, StageName::PolicyCheck, reply)?
            .unwrap_or_else(|| RECOVERED_REPLY.to_string());

        info!(
            stage = %StageName::PolicyCheck,
            vehicle_type = vehicle_type.as_str(),
            policy_check = %response,
            "Policy check complete"
        );

        let state = ClaimState {
            policy_check: response.clone(),
            ..state
        }
        .record(TraceEntry::new(StageName::PolicyCheck, prompt, response));

        Ok(TaskResult::new(state, NextAction::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(value: serde_json::Value) -> Claim {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_vehicle_classification() {
        assert_eq!(
            classify_vehicle(&claim(json!({"model": "Zen Four-Wheeler X"}))),
            VehicleType::FourWheeler
        );
        assert_eq!(
            classify_vehicle(&claim(json!({"model": "Zen Scooter"}))),
            VehicleType::TwoWheeler
        );
        assert_eq!(
            classify_vehicle(&claim(json!({"mileage": 100}))),
            VehicleType::TwoWheeler
        );
        // the marker is case sensitive
        assert_eq!(
            classify_vehicle(&claim(json!({"model": "four-wheeler"}))),
            VehicleType::TwoWheeler
        );
    }

    #[test]
    fn test_prompt_carries_policy_vehicle_and_claim() {
        let prompt = build_prompt(
            "Batteries covered 2 years.",
            VehicleType::FourWheeler,
            &claim(json!({"part": "battery"})),
        );
        assert!(prompt.contains("Batteries covered 2 years."));
        assert!(prompt.contains("Vehicle type: Four-Wheeler"));
        assert!(prompt.contains(r#"{"part":"battery"}"#));
        assert!(prompt.contains(r#""Not covered by policy""#));
    }
}
