use graph_flow::{Graph, GraphBuilder, Task};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::error::PipelineError;
use crate::models::{Claim, ClaimOutcome, ClaimState, Decision, FailedRow, ResultRow, StageName};
use crate::parsing::{DecisionParser, FallbackRules};
use crate::policy::PolicyDocument;
use crate::reasoning::ReasoningClient;
use crate::tasks::{DecisionTask, EvidenceCollectionTask, FraudScoringTask, PolicyCheckTask};

/// Policy check → fraud scoring → evidence collection → decision
pub fn build_claim_workflow(
    policy: PolicyDocument,
    reasoning: Arc<dyn ReasoningClient>,
    parser: DecisionParser,
    fallback: FallbackRules,
) -> Graph<ClaimState> {
    let policy_check = Arc::new(PolicyCheckTask::new(policy.clone(), reasoning.clone()));
    let policy_check_id = policy_check.id().to_string();

    let fraud_scoring = Arc::new(FraudScoringTask::new(policy.clone(), reasoning.clone()));
    let fraud_scoring_id = fraud_scoring.id().to_string();

    let evidence_collection = Arc::new(EvidenceCollectionTask::new(policy.clone(), reasoning.clone()));
    let evidence_collection_id = evidence_collection.id().to_string();

    let decision = Arc::new(
        DecisionTask::new(policy, reasoning)
            .with_parser(parser)
            .with_fallback(fallback),
    );
    let decision_id = decision.id().to_string();

    GraphBuilder::new("warranty_claim_adjudication")
        .add_task(policy_check)
        .add_task(fraud_scoring)
        .add_task(evidence_collection)
        .add_task(decision)
        .add_edge(&policy_check_id, &fraud_scoring_id)
        .add_edge(&fraud_scoring_id, &evidence_collection_id)
        .add_edge(&evidence_collection_id, &decision_id)
        .build()
}

/// What a batch does when one claim's stages fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the batch and return the error; no rows are returned
    #[default]
    AbortBatch,
    /// Record the claim as failed and carry on with the next one
    IsolateClaim,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::AbortBatch),
            "isolate" => Ok(FailurePolicy::IsolateClaim),
            _ => Err(ConfigError::InvalidValue {
                name: "FAILURE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

/// Receives `(current, total)` after each claim, `current` being 1-based.
/// Errors are logged and otherwise ignored.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, current: usize, total: usize) -> anyhow::Result<()>;
}

pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _current: usize, _total: usize) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, current: usize, total: usize) -> anyhow::Result<()> {
        info!(current, total, "Claim processed");
        Ok(())
    }
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) -> anyhow::Result<()> + Send + Sync,
{
    fn on_progress(&self, current: usize, total: usize) -> anyhow::Result<()> {
        self(current, total)
    }
}

/// Decision counts for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub approved: usize,
    pub rejected: usize,
    pub escalated: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ClaimOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    ClaimOutcome::Completed(row) => match row.decision {
                        Decision::Approve => summary.approved += 1,
                        Decision::Reject => summary.rejected += 1,
                        Decision::Escalate => summary.escalated += 1,
                    },
                    ClaimOutcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }
}

/// Runs the adjudication workflow over batches of claims, one claim at a time
pub struct ClaimPipeline {
    graph: Graph<ClaimState>,
    failure_policy: FailurePolicy,
}

impl ClaimPipeline {
    pub fn new(policy: PolicyDocument, reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self::from_graph(build_claim_workflow(
            policy,
            reasoning,
            DecisionParser::default(),
            FallbackRules::default(),
        ))
    }

    pub fn from_graph(graph: Graph<ClaimState>) -> Self {
        Self {
            graph,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Run all four stages over a fresh state for `claim`
    pub async fn process_claim(&self, claim: Claim) -> graph_flow::Result<ClaimState> {
        let result = self.graph.execute(ClaimState::new(claim)).await?;
        Ok(result.state)
    }

    /// Process `claims` in order, returning one outcome per claim in input order
    pub async fn process_claims(
        &self,
        claims: Vec<Claim>,
        progress: &dyn ProgressObserver,
    ) -> Result<Vec<ClaimOutcome>, PipelineError> {
        let total = claims.len();
        let run_id = Uuid::new_v4();
        let span = info_span!("claim_batch", run_id = %run_id, total);

        async move {
            info!(failure_policy = ?self.failure_policy, "Starting claim batch");
            let mut outcomes = Vec::with_capacity(total);

            for (offset, claim) in claims.into_iter().enumerate() {
                let index = offset + 1;
                let outcome = self
                    .run_claim(index, claim)
                    .instrument(info_span!("claim", claim_index = index))
                    .await?;
                outcomes.push(outcome);

                if let Err(e) = progress.on_progress(index, total) {
                    warn!(current = index, total, error = %e, "Progress observer failed");
                }
            }

            let summary = BatchSummary::from_outcomes(&outcomes);
            info!(
                approved = summary.approved,
                rejected = summary.rejected,
                escalated = summary.escalated,
                failed = summary.failed,
                "Claim batch complete"
            );
            Ok::<_, PipelineError>(outcomes)
        }
        .instrument(span)
        .await
    }

    async fn run_claim(&self, index: usize, claim: Claim) -> Result<ClaimOutcome, PipelineError> {
        let retained = match self.failure_policy {
            FailurePolicy::IsolateClaim => Some(claim.clone()),
            FailurePolicy::AbortBatch => None,
        };

        let source = match self.process_claim(claim).await {
            Ok(state) => {
                return ResultRow::from_state(state)
                    .map(ClaimOutcome::Completed)
                    .map_err(|_| PipelineError::MissingDecision { index });
            }
            Err(source) => source,
        };

        let stage = source.task_id().and_then(StageName::from_task_id);
        error!(
            stage = ?stage,
            error = %source,
            "Claim processing failed"
        );

        match retained {
            Some(claim) => Ok(ClaimOutcome::Failed(FailedRow {
                claim,
                stage,
                error: source.to_string(),
            })),
            None => Err(PipelineError::ClaimFailed { index, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::AbortBatch);
        assert_eq!(" Isolate ".parse::<FailurePolicy>().unwrap(), FailurePolicy::IsolateClaim);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let row = |decision| {
            ClaimOutcome::Completed(ResultRow {
                claim: Claim::default(),
                policy_check: String::new(),
                fraud_score: 0.0,
                evidence: String::new(),
                decision,
                agent_trace: Vec::new(),
            })
        };
        let outcomes = vec![
            row(Decision::Approve),
            row(Decision::Approve),
            row(Decision::Escalate),
            ClaimOutcome::Failed(FailedRow {
                claim: Claim::default(),
                stage: Some(StageName::PolicyCheck),
                error: "boom".into(),
            }),
        ];

        assert_eq!(
            BatchSummary::from_outcomes(&outcomes),
            BatchSummary {
                approved: 2,
                rejected: 0,
                escalated: 1,
                failed: 1,
            }
        );
    }
}
