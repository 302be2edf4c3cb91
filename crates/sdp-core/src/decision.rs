//! Synthesis results and round decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Proposal, Solution};

/// Result of applying one synthesis rule to a proposal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// The chosen solution
    pub solution: Solution,
    /// Name of the rule that produced it
    pub rule_name: String,
    /// Set only when a single agent's proposal was selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_agent: Option<String>,
    /// Human-readable justification
    pub reasoning: String,
    /// Full input set, retained for audit
    pub proposals: Vec<Proposal>,
}

/// Terminal status of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// A rule resolved the proposals
    Approved,
    /// No rule resolved the proposals; a human must decide
    Escalated,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Escalated => write!(f, "escalated"),
        }
    }
}

/// The single output of a decision round
///
/// Approved decisions carry a solution and the (non-empty) rule name;
/// escalated decisions carry a reason instead. Both keep every proposal
/// the round gathered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub round_id: Uuid,
    pub status: DecisionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_agent: Option<String>,
    pub proposals: Vec<Proposal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// Package a synthesis result as an approved decision
    pub fn approved(round_id: Uuid, result: SynthesisResult) -> Self {
        Self {
            round_id,
            status: DecisionStatus::Approved,
            solution: Some(result.solution),
            rule_name: Some(result.rule_name),
            winning_agent: result.winning_agent,
            proposals: result.proposals,
            reason: None,
            decided_at: Utc::now(),
        }
    }

    /// Escalate a proposal set to human review
    pub fn escalated(round_id: Uuid, proposals: Vec<Proposal>, reason: impl Into<String>) -> Self {
        Self {
            round_id,
            status: DecisionStatus::Escalated,
            solution: None,
            rule_name: None,
            winning_agent: None,
            proposals,
            reason: Some(reason.into()),
            decided_at: Utc::now(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }

    pub fn is_escalated(&self) -> bool {
        self.status == DecisionStatus::Escalated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposals() -> Vec<Proposal> {
        vec![
            Proposal::new("agent-1", "TDD", 0.8, "").unwrap(),
            Proposal::new("agent-2", "spike", 0.8, "").unwrap(),
        ]
    }

    #[test]
    fn test_approved_decision_carries_rule() {
        let result = SynthesisResult {
            solution: Solution::from("TDD"),
            rule_name: "domain_expertise".to_string(),
            winning_agent: Some("agent-1".to_string()),
            reasoning: "Agent agent-1 has highest confidence (0.80)".to_string(),
            proposals: proposals(),
        };

        let decision = Decision::approved(Uuid::new_v4(), result);

        assert!(decision.is_approved());
        assert_eq!(decision.solution, Some(Solution::from("TDD")));
        assert_eq!(decision.rule_name.as_deref(), Some("domain_expertise"));
        assert_eq!(decision.winning_agent.as_deref(), Some("agent-1"));
        assert!(decision.reason.is_none());
        assert_eq!(decision.proposals.len(), 2);
    }

    #[test]
    fn test_escalated_decision_serializes_without_solution() {
        let decision = Decision::escalated(Uuid::new_v4(), proposals(), "Synthesis failed");
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["status"], "escalated");
        assert_eq!(json["reason"], "Synthesis failed");
        assert!(json.get("solution").is_none());
        assert!(json.get("rule_name").is_none());

        let restored: Decision = serde_json::from_value(json).unwrap();
        assert_eq!(restored, decision);
    }
}
