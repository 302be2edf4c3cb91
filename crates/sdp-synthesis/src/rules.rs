//! Synthesis rules
//!
//! A rule is a named, prioritized policy that can claim a proposal set and
//! resolve it. Rules are pure: no state, no I/O.

use sdp_core::{Proposal, Result, SdpError, SynthesisResult};

/// A policy that may resolve a set of proposals into one result
pub trait SynthesisRule: Send + Sync {
    /// Rule name, reported on the result and the decision
    fn name(&self) -> &str;

    /// Evaluation priority (lower runs earlier)
    fn priority(&self) -> i32;

    /// Whether this rule claims the given proposals
    fn can_apply(&self, proposals: &[Proposal]) -> bool;

    /// Resolve the proposals
    fn apply(&self, proposals: &[Proposal]) -> Result<SynthesisResult>;
}

/// Applies when every agent proposed the same solution
#[derive(Debug, Clone, Copy, Default)]
pub struct UnanimousRule;

impl UnanimousRule {
    pub const NAME: &'static str = "unanimous";
    pub const PRIORITY: i32 = 1;

    pub fn new() -> Self {
        Self
    }
}

impl SynthesisRule for UnanimousRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_apply(&self, proposals: &[Proposal]) -> bool {
        match proposals.split_first() {
            Some((first, rest)) if !rest.is_empty() => {
                rest.iter().all(|p| p.solution() == first.solution())
            }
            _ => false,
        }
    }

    fn apply(&self, proposals: &[Proposal]) -> Result<SynthesisResult> {
        if !self.can_apply(proposals) {
            return Err(SdpError::RuleApply {
                rule: Self::NAME.to_string(),
                reason: "proposals do not share one solution".to_string(),
            });
        }

        Ok(SynthesisResult {
            solution: proposals[0].solution().clone(),
            rule_name: Self::NAME.to_string(),
            winning_agent: None,
            reasoning: "All agents agreed on the same solution".to_string(),
            proposals: proposals.to_vec(),
        })
    }
}

/// Applies when exactly one agent holds the highest confidence
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainExpertiseRule;

impl DomainExpertiseRule {
    pub const NAME: &'static str = "domain_expertise";
    pub const PRIORITY: i32 = 2;

    pub fn new() -> Self {
        Self
    }

    /// The single proposal holding the maximum confidence, if it is not tied
    fn leader(proposals: &[Proposal]) -> Option<&Proposal> {
        let max = proposals.iter().map(Proposal::confidence).max()?;
        let mut at_max = proposals.iter().filter(|p| p.confidence() == max);
        let leader = at_max.next()?;
        at_max.next().is_none().then_some(leader)
    }
}

impl SynthesisRule for DomainExpertiseRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_apply(&self, proposals: &[Proposal]) -> bool {
        Self::leader(proposals).is_some()
    }

    fn apply(&self, proposals: &[Proposal]) -> Result<SynthesisResult> {
        let best = Self::leader(proposals).ok_or_else(|| SdpError::RuleApply {
            rule: Self::NAME.to_string(),
            reason: "no unique highest-confidence proposal".to_string(),
        })?;

        Ok(SynthesisResult {
            solution: best.solution().clone(),
            rule_name: Self::NAME.to_string(),
            winning_agent: Some(best.agent_id().to_string()),
            reasoning: format!(
                "Agent {} has highest confidence ({})",
                best.agent_id(),
                best.confidence()
            ),
            proposals: proposals.to_vec(),
        })
    }
}
