//! Proposal accumulator that synthesizes through the rule engine

use sdp_core::{Proposal, Result, SdpError, SynthesisResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::engine::RuleEngine;

/// Divergence among a proposal set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// All proposals share one solution
    NoConflict,
    /// Reserved: formatting or style differences (never produced)
    MinorConflict,
    /// Reserved: approach or implementation differences (never produced)
    MediumConflict,
    /// Proposals recommend different solutions
    MajorConflict,
}

/// Collects one proposal per agent and reduces them with a [`RuleEngine`]
///
/// A later proposal from the same agent replaces the earlier one. Call
/// [`Synthesizer::clear`] between rounds, otherwise stale proposals leak
/// into the next synthesis.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    engine: RuleEngine,
    proposals: BTreeMap<String, Proposal>,
}

impl Synthesizer {
    /// Create a synthesizer backed by the default rules
    pub fn new() -> Self {
        Self::with_engine(RuleEngine::with_default_rules())
    }

    pub fn with_engine(engine: RuleEngine) -> Self {
        Self {
            engine,
            proposals: BTreeMap::new(),
        }
    }

    /// Add a proposal, returning the one it replaced for the same agent
    pub fn add_proposal(&mut self, proposal: Proposal) -> Option<Proposal> {
        let replaced = self
            .proposals
            .insert(proposal.agent_id().to_string(), proposal);
        if let Some(old) = &replaced {
            debug!("Replaced earlier proposal from {}", old.agent_id());
        }
        replaced
    }

    /// All stored proposals, ordered by agent id
    pub fn proposals(&self) -> Vec<Proposal> {
        self.proposals.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Remove all proposals
    pub fn clear(&mut self) {
        self.proposals.clear();
    }

    /// Reduce the stored proposals to a single result
    pub fn synthesize(&self) -> Result<SynthesisResult> {
        if self.proposals.is_empty() {
            return Err(SdpError::NoProposals);
        }
        self.engine.execute(&self.proposals())
    }

    /// Classify how far the stored proposals diverge
    pub fn detect_conflict(&self) -> ConflictType {
        let distinct: HashSet<String> = self
            .proposals
            .values()
            .map(|p| p.solution().fingerprint())
            .collect();

        if distinct.len() <= 1 {
            ConflictType::NoConflict
        } else {
            ConflictType::MajorConflict
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}
