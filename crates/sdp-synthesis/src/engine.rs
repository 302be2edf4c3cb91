//! Rule engine: first-match-wins dispatch over prioritized rules

use sdp_core::{Proposal, Result, SdpError, SynthesisResult};
use std::sync::Arc;
use tracing::debug;

use crate::rules::{DomainExpertiseRule, SynthesisRule, UnanimousRule};

/// Executes synthesis rules in ascending priority order
///
/// Rules with equal priority keep their insertion order. The first rule
/// whose `can_apply` returns true decides the round; later rules are never
/// consulted, even when that rule then fails to apply.
///
/// Results are normalized before they leave the engine: the result always
/// carries the full input set, and a blank rule name is replaced with the
/// claiming rule's name.
#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn SynthesisRule>>,
}

impl RuleEngine {
    /// Create an engine with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the built-in unanimous and domain-expertise rules
    pub fn with_default_rules() -> Self {
        Self {
            rules: vec![
                Arc::new(UnanimousRule::new()),
                Arc::new(DomainExpertiseRule::new()),
            ],
        }
    }

    /// Add a rule, keeping the chain sorted by priority
    pub fn add_rule(&mut self, rule: Arc<dyn SynthesisRule>) -> Result<()> {
        if rule.name().trim().is_empty() {
            return Err(SdpError::InvalidRule(
                "rule name must not be empty".to_string(),
            ));
        }

        self.rules.push(rule);
        // sort_by_key is stable
        self.rules.sort_by_key(|r| r.priority());
        Ok(())
    }

    /// All rules, in evaluation order
    pub fn rules(&self) -> &[Arc<dyn SynthesisRule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the first applicable rule
    pub fn execute(&self, proposals: &[Proposal]) -> Result<SynthesisResult> {
        for rule in &self.rules {
            if rule.can_apply(proposals) {
                debug!(
                    "Rule '{}' (priority {}) claimed {} proposals",
                    rule.name(),
                    rule.priority(),
                    proposals.len()
                );
                let mut result = rule.apply(proposals)?;
                if result.rule_name.trim().is_empty() {
                    result.rule_name = rule.name().to_string();
                }
                result.proposals = proposals.to_vec();
                return Ok(result);
            }
        }

        debug!("No rule applies to {} proposals", proposals.len());
        Err(SdpError::CannotSynthesize)
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (r.name(), r.priority())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_core::Solution;
    use serde_json::json;

    /// Scripted rule that answers with its own name
    struct FixedRule {
        name: String,
        priority: i32,
        applies: bool,
        fails: bool,
        anonymous: bool,
    }

    impl FixedRule {
        fn new(name: &str, priority: i32) -> Self {
            Self {
                name: name.to_string(),
                priority,
                applies: true,
                fails: false,
                anonymous: false,
            }
        }

        fn never_applies(mut self) -> Self {
            self.applies = false;
            self
        }

        fn failing(mut self) -> Self {
            self.fails = true;
            self
        }

        /// Answer with a blank rule name and no proposals
        fn anonymous(mut self) -> Self {
            self.anonymous = true;
            self
        }
    }

    impl SynthesisRule for FixedRule {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn can_apply(&self, _proposals: &[Proposal]) -> bool {
            self.applies
        }

        fn apply(&self, proposals: &[Proposal]) -> Result<SynthesisResult> {
            if self.fails {
                return Err(SdpError::RuleApply {
                    rule: self.name.clone(),
                    reason: "boom".to_string(),
                });
            }
            if self.anonymous {
                return Ok(SynthesisResult {
                    solution: Solution::from(self.name.as_str()),
                    rule_name: String::new(),
                    winning_agent: None,
                    reasoning: String::new(),
                    proposals: Vec::new(),
                });
            }
            Ok(SynthesisResult {
                solution: Solution::from(self.name.as_str()),
                rule_name: self.name.clone(),
                winning_agent: None,
                reasoning: format!("{} decided", self.name),
                proposals: proposals.to_vec(),
            })
        }
    }

    fn conflicting() -> Vec<Proposal> {
        vec![
            Proposal::new("agent-1", json!("TDD"), 0.8, "").unwrap(),
            Proposal::new("agent-2", json!("spike"), 0.8, "").unwrap(),
        ]
    }

    #[test]
    fn test_dispatch_follows_priority_not_registration() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Arc::new(FixedRule::new("p5", 5))).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("p1", 1))).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("p3", 3))).unwrap();

        let names: Vec<&str> = engine.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["p1", "p3", "p5"]);

        let result = engine.execute(&conflicting()).unwrap();
        assert_eq!(result.rule_name, "p1");
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Arc::new(FixedRule::new("first", 2))).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("second", 2))).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("early", 1).never_applies())).unwrap();

        let result = engine.execute(&conflicting()).unwrap();
        assert_eq!(result.rule_name, "first");
    }

    #[test]
    fn test_skips_rules_that_do_not_apply() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Arc::new(FixedRule::new("no", 1).never_applies())).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("yes", 9))).unwrap();

        assert_eq!(engine.execute(&conflicting()).unwrap().rule_name, "yes");
    }

    #[test]
    fn test_claimed_rule_failure_is_not_retried_lower() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Arc::new(FixedRule::new("broken", 1).failing())).unwrap();
        engine.add_rule(Arc::new(FixedRule::new("fallback", 2))).unwrap();

        let err = engine.execute(&conflicting()).unwrap_err();
        assert!(matches!(err, SdpError::RuleApply { rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_no_applicable_rule_cannot_synthesize() {
        let engine = RuleEngine::with_default_rules();
        assert!(matches!(
            engine.execute(&conflicting()),
            Err(SdpError::CannotSynthesize)
        ));
        assert!(matches!(
            RuleEngine::new().execute(&conflicting()),
            Err(SdpError::CannotSynthesize)
        ));
    }

    #[test]
    fn test_default_rules_prefer_unanimous() {
        let engine = RuleEngine::with_default_rules();
        assert_eq!(engine.len(), 2);

        let proposals = vec![
            Proposal::new("agent-1", json!("TDD"), 0.9, "").unwrap(),
            Proposal::new("agent-2", json!("TDD"), 0.85, "").unwrap(),
            Proposal::new("agent-3", json!("TDD"), 0.95, "").unwrap(),
        ];

        // Both rules could apply; unanimous has the higher priority
        let result = engine.execute(&proposals).unwrap();
        assert_eq!(result.rule_name, "unanimous");
        assert!(result.winning_agent.is_none());
    }

    #[test]
    fn test_rejects_unnamed_rule() {
        let mut engine = RuleEngine::new();
        let err = engine.add_rule(Arc::new(FixedRule::new("  ", 1))).unwrap_err();
        assert!(matches!(err, SdpError::InvalidRule(_)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_result_is_stamped_with_claiming_rule_and_inputs() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Arc::new(FixedRule::new("terse", 1).anonymous())).unwrap();

        let proposals = conflicting();
        let result = engine.execute(&proposals).unwrap();
        assert_eq!(result.rule_name, "terse");
        assert_eq!(result.proposals, proposals);
    }
}
