//! # sdp-core
//!
//! Core types for multi-agent decision synthesis.
//!
//! Specialists ("agents") answer a task with a [`Proposal`]. A round gathers
//! those proposals and reduces them into exactly one [`Decision`]: either
//! approved by a synthesis rule, or escalated to a human reviewer when no
//! rule can pick a winner.
//!
//! ## Core Paradigm
//!
//! - Proposals are immutable values, compared structurally
//! - Solutions are opaque but canonical, so equality never depends on key order
//! - "No usable input" is an error; "usable input, no winner" is data

pub mod config;
mod decision;
mod error;
pub mod fail_open;
mod types;

pub use config::{SdpConfig, SynthesisSettings};
pub use decision::{Decision, DecisionStatus, SynthesisResult};
pub use error::{Result, SdpError};
pub use types::*;
