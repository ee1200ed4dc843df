//! Coercion of free-text reasoning replies into structured values.
//!
//! The decision parser is deliberately crude: it looks at the first line of
//! the reply only, lower-cases it, and checks keyword substrings in a fixed
//! priority order. The first rule with a matching keyword wins, so a reply
//! like "Approve, do not reject" is an approval.

use crate::models::Decision;
use crate::tasks::types::NOT_COVERED_BY_POLICY;

/// Characters that end the first line of a reply
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Result of parsing a decision reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDecision {
    Matched(Decision),
    Unparsed,
}

/// Keywords that select one decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRule {
    pub decision: Decision,
    pub keywords: Vec<String>,
}

impl DecisionRule {
    pub fn new(decision: Decision, keywords: &[&str]) -> Self {
        Self {
            decision,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered keyword rules applied to the first line of a decision reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionParser {
    rules: Vec<DecisionRule>,
}

impl DecisionParser {
    pub fn new(rules: Vec<DecisionRule>) -> Self {
        Self { rules }
    }

    pub fn parse(&self, response: &str) -> ParsedDecision {
        let first_line = response
            .trim()
            .split(LINE_BREAKS)
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| first_line.contains(k.as_str())))
            .map_or(ParsedDecision::Unparsed, |rule| ParsedDecision::Matched(rule.decision))
    }
}

impl Default for DecisionParser {
    /// approve, then reject, then escalate / hitl / human
    fn default() -> Self {
        Self::new(vec![
            DecisionRule::new(Decision::Approve, &["approve"]),
            DecisionRule::new(Decision::Reject, &["reject"]),
            DecisionRule::new(Decision::Escalate, &["escalate", "hitl", "human"]),
        ])
    }
}

/// Deterministic decision used when the reasoning step gives no usable answer
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRules {
    /// Scores strictly above this escalate
    pub escalate_above: f64,
}

impl Default for FallbackRules {
    fn default() -> Self {
        Self {
            escalate_above: 0.5,
        }
    }
}

impl FallbackRules {
    pub fn decide(&self, policy_check: &str, fraud_score: f64) -> Decision {
        if policy_check == NOT_COVERED_BY_POLICY {
            Decision::Reject
        } else if fraud_score > self.escalate_above {
            Decision::Escalate
        } else {
            Decision::Approve
        }
    }
}

/// Parse a fraud likelihood; only finite numbers in `[0, 1]` are accepted.
pub fn parse_fraud_score(response: &str) -> Option<f64> {
    response
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite() && (0.0..=1.0).contains(score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_each_label() {
        let parser = DecisionParser::default();
        assert_eq!(
            parser.parse("Approve claim\nAll checks passed."),
            ParsedDecision::Matched(Decision::Approve)
        );
        assert_eq!(
            parser.parse("  REJECT CLAIM  \nPart excluded."),
            ParsedDecision::Matched(Decision::Reject)
        );
        assert_eq!(
            parser.parse("Escalate to HITL"),
            ParsedDecision::Matched(Decision::Escalate)
        );
        assert_eq!(
            parser.parse("Needs a human reviewer"),
            ParsedDecision::Matched(Decision::Escalate)
        );
    }

    #[test]
    fn test_first_line_ends_at_any_line_break() {
        let parser = DecisionParser::default();
        assert_eq!(parser.parse("I'm not sure\rApprove claim"), ParsedDecision::Unparsed);
        assert_eq!(parser.parse("I'm not sure\u{2028}Reject claim"), ParsedDecision::Unparsed);
        assert_eq!(parser.parse("I'm not sure\r\nEscalate to HITL"), ParsedDecision::Unparsed);
        assert_eq!(
            parser.parse("Reject claim\rApprove would be wrong"),
            ParsedDecision::Matched(Decision::Reject)
        );
    }

    #[test]
    fn test_priority_order_prefers_approve() {
        let parser = DecisionParser::default();
        assert_eq!(
            parser.parse("Approve rather than reject"),
            ParsedDecision::Matched(Decision::Approve)
        );
        assert_eq!(
            parser.parse("Reject, no need to escalate"),
            ParsedDecision::Matched(Decision::Reject)
        );
    }

    #[test]
    fn test_only_first_line_counts() {
        let parser = DecisionParser::default();
        assert_eq!(
            parser.parse("I'm not sure\nApprove claim"),
            ParsedDecision::Unparsed
        );
        assert_eq!(parser.parse(""), ParsedDecision::Unparsed);
    }

    #[test]
    fn test_custom_rules() {
        let parser = DecisionParser::new(vec![DecisionRule::new(Decision::Reject, &["DENY"])]);
        assert_eq!(
            parser.parse("deny"),
            ParsedDecision::Matched(Decision::Reject)
        );
        assert_eq!(parser.parse("approve"), ParsedDecision::Unparsed);
    }

    #[test]
    fn test_fallback_rules() {
        let rules = FallbackRules::default();
        assert_eq!(rules.decide("Not covered by policy", 0.1), Decision::Reject);
        assert_eq!(rules.decide("Not covered by policy", 0.9), Decision::Reject);
        assert_eq!(rules.decide("Covered by policy", 0.7), Decision::Escalate);
        assert_eq!(rules.decide("Covered by policy", 0.5), Decision::Approve);
        assert_eq!(rules.decide("Covered by policy", 0.2), Decision::Approve);
        // only the exact phrase counts as non-coverage
        assert_eq!(rules.decide("not covered by policy.", 0.2), Decision::Approve);
    }

    #[test]
    fn test_fraud_score_parsing() {
        assert_eq!(parse_fraud_score("0.82"), Some(0.82));
        assert_eq!(parse_fraud_score(" 1 "), Some(1.0));
        assert_eq!(parse_fraud_score("high"), None);
        assert_eq!(parse_fraud_score(""), None);
        assert_eq!(parse_fraud_score("1.7"), None);
        assert_eq!(parse_fraud_score("-0.2"), None);
        assert_eq!(parse_fraud_score("NaN"), None);
    }
}
