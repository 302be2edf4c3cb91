//! # sdp-synthesis
//!
//! Rule-based synthesis of specialist proposals into a single decision.
//!
//! This crate provides:
//! - Pluggable synthesis rules evaluated first-match-wins by priority
//! - A rule engine and a proposal-accumulating synthesizer
//! - The agent capability consumed from outside collaborators
//! - A supervisor that consults agents concurrently under a shared deadline
//!   and packages the outcome as an approved or escalated decision

mod agent;
mod engine;
mod rules;
mod supervisor;
mod synthesizer;

pub use agent::{Agent, AgentRegistry, MockAgent};
pub use engine::RuleEngine;
pub use rules::{DomainExpertiseRule, SynthesisRule, UnanimousRule};
pub use supervisor::{AgentStatus, Supervisor, SupervisorConfig};
pub use synthesizer::{ConflictType, Synthesizer};

pub use sdp_core::{
    Confidence, Decision, DecisionStatus, Proposal, Result, SdpError, Solution, SynthesisResult,
};
