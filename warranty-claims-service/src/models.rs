use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A single warranty claim: an opaque mapping of column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claim(Map<String, Value>);

impl Claim {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field rendered as text. Strings come back unquoted, other values as JSON.
    pub fn text_field(&self, field: &str) -> Option<String> {
        self.0.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Compact rendering used inside prompts
    pub fn details(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for Claim {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    #[serde(rename = "policy_check_agent")]
    PolicyCheck,
    #[serde(rename = "fraud_scoring_agent")]
    FraudScoring,
    #[serde(rename = "evidence_collector_agent")]
    EvidenceCollection,
    #[serde(rename = "action_agent")]
    Decision,
}

impl StageName {
    pub const ALL: [StageName; 4] = [
        StageName::PolicyCheck,
        StageName::FraudScoring,
        StageName::EvidenceCollection,
        StageName::Decision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::PolicyCheck => "policy_check_agent",
            StageName::FraudScoring => "fraud_scoring_agent",
            StageName::EvidenceCollection => "evidence_collector_agent",
            StageName::Decision => "action_agent",
        }
    }

    pub fn from_task_id(task_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == task_id)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final adjudication outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Approve claim")]
    Approve,
    #[serde(rename = "Reject claim")]
    Reject,
    #[serde(rename = "Escalate to HITL")]
    Escalate,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approve => "Approve claim",
            Decision::Reject => "Reject claim",
            Decision::Escalate => "Escalate to HITL",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reasoning call (or its rule-based stand-in) made for a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub agent: StageName,
    pub prompt: String,
    pub response: String,
}

impl TraceEntry {
    pub fn new(agent: StageName, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            agent,
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    pub fn is_rule_based_fallback(&self) -> bool {
        self.prompt == crate::tasks::types::RULE_BASED_FALLBACK_PROMPT
    }
}

/// Working record threaded through the stages for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimState {
    pub claim: Claim,
    pub policy_check: String,
    pub fraud_score: f64,
    pub evidence: String,
    pub decision: Option<Decision>,
    pub trace: Vec<TraceEntry>,
}

impl ClaimState {
    pub fn new(claim: Claim) -> Self {
        Self {
            claim,
            policy_check: String::new(),
            fraud_score: 0.0,
            evidence: String::new(),
            decision: None,
            trace: Vec::new(),
        }
    }

    /// Append a trace entry, returning the updated state
    pub fn record(mut self, entry: TraceEntry) -> Self {
        self.trace.push(entry);
        self
    }
}

/// Output row: the claim's own columns followed by the pipeline columns.
/// Pipeline columns replace claim columns of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub claim: Claim,
    pub policy_check: String,
    pub fraud_score: f64,
    pub evidence: String,
    pub decision: Decision,
    pub agent_trace: Vec<TraceEntry>,
}

impl ResultRow {
    /// Flatten a finished state. Returns the state back if no decision was made.
    pub fn from_state(state: ClaimState) -> Result<Self, ClaimState> {
        let Some(decision) = state.decision else {
            return Err(state);
        };
        Ok(Self {
            claim: state.claim,
            policy_check: state.policy_check,
            fraud_score: state.fraud_score,
            evidence: state.evidence,
            decision,
            agent_trace: state.trace,
        })
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = self.claim.fields().clone();
        row.insert("policy_check".into(), Value::from(self.policy_check.as_str()));
        row.insert("fraud_score".into(), Value::from(self.fraud_score));
        row.insert("evidence".into(), Value::from(self.evidence.as_str()));
        row.insert("decision".into(), Value::from(self.decision.label()));
        row.insert(
            "agent_trace".into(),
            serde_json::to_value(&self.agent_trace).map_err(S::Error::custom)?,
        );
        serialize_row(row, serializer)
    }
}

/// A claim whose processing failed under claim isolation
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRow {
    pub claim: Claim,
    pub stage: Option<StageName>,
    pub error: String,
}

impl Serialize for FailedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = self.claim.fields().clone();
        row.insert("status".into(), Value::from("failed"));
        row.insert(
            "failed_stage".into(),
            self.stage.map_or(Value::Null, |stage| Value::from(stage.as_str())),
        );
        row.insert("error".into(), Value::from(self.error.as_str()));
        serialize_row(row, serializer)
    }
}

fn serialize_row<S: Serializer>(row: Map<String, Value>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(row.len()))?;
    for (key, value) in &row {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Per-claim result of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClaimOutcome {
    Completed(ResultRow),
    Failed(FailedRow),
}

impl ClaimOutcome {
    pub fn as_completed(&self) -> Option<&ResultRow> {
        match self {
            ClaimOutcome::Completed(row) => Some(row),
            ClaimOutcome::Failed(_) => None,
        }
    }
}
