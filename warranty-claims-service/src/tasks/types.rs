/// Claim `model` substring that marks a four-wheeler
pub const FOUR_WHEELER_MARKER: &str = "Four-Wheeler";

pub const COVERED_BY_POLICY: &str = "Covered by policy";
pub const NOT_COVERED_BY_POLICY: &str = "Not covered by policy";

/// Evidence reply the prompt asks for when nothing is wrong
pub const NO_ISSUES: &str = "No issues";

/// Score used when the fraud scoring reply is not a usable number
pub const NEUTRAL_FRAUD_SCORE: f64 = 0.5;

/// Prompt recorded in the trace when the decision came from the rule-based fallback
pub const RULE_BASED_FALLBACK_PROMPT: &str = "(rule-based fallback)";

/// Stored as a stage's output when its failed reasoning call was recovered
pub const RECOVERED_REPLY: &str = "(reasoning call failed)";

/// What a stage does when its reasoning call itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Fail the task; the batch policy decides what happens to the claim
    Propagate,
    /// Handle the failure inside the stage
    Recover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    FourWheeler,
    TwoWheeler,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::FourWheeler => "Four-Wheeler",
            VehicleType::TwoWheeler => "Two-Wheeler",
        }
    }
}
