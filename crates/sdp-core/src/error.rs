//! Unified error types for decision synthesis

use thiserror::Error;

/// Unified error type for all synthesis operations
#[derive(Error, Debug)]
pub enum SdpError {
    // Round outcomes
    #[error("no proposals received from agents")]
    NoProposals,

    #[error("cannot synthesize: conflicting proposals")]
    CannotSynthesize,

    #[error("round cancelled")]
    Cancelled,

    #[error("failed to consult agents: {0}")]
    Consultation(#[source] Box<SdpError>),

    // Rule errors
    #[error("Rule '{rule}' failed to apply: {reason}")]
    RuleApply { rule: String, reason: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    // Agent errors
    #[error("Agent {agent} consultation failed: {reason}")]
    AgentConsult { agent: String, reason: String },

    #[error("Agent {0} timed out")]
    AgentTimeout(String),

    // Value errors
    #[error("Invalid confidence {0}: must be a finite value within [0, 1]")]
    InvalidConfidence(f64),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl SdpError {
    /// True when the round failed because no agent produced a proposal,
    /// whether or not the error was wrapped with consultation context.
    pub fn is_no_proposals(&self) -> bool {
        match self {
            Self::NoProposals => true,
            Self::Consultation(inner) => inner.is_no_proposals(),
            _ => false,
        }
    }

    /// True when the round was abandoned through its cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Consultation(inner) => inner.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type alias using SdpError
pub type Result<T> = std::result::Result<T, SdpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_no_proposals_is_detected() {
        let err = SdpError::Consultation(Box::new(SdpError::NoProposals));
        assert!(err.is_no_proposals());
        assert!(!err.is_cancelled());
        assert_eq!(
            err.to_string(),
            "failed to consult agents: no proposals received from agents"
        );
    }

    #[test]
    fn test_cancelled_is_not_no_proposals() {
        assert!(SdpError::Cancelled.is_cancelled());
        assert!(!SdpError::Cancelled.is_no_proposals());
        assert!(!SdpError::CannotSynthesize.is_no_proposals());
    }
}
