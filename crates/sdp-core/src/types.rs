//! Core type definitions for decision synthesis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::{Result, SdpError};

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Opaque solution payload recommended by a proposal
///
/// Solutions are stored in canonical form: object keys sorted, integral
/// floats folded into integers (`1.0` == `1`), and `-0.0` folded into `0`.
/// Equality and hashing are defined over that form, so two solutions built
/// from differently ordered maps compare equal.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Solution(Value);

impl Solution {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(canonicalize(value.into()))
    }

    /// Build a solution from any serializable value
    pub fn from_serialize<S: Serialize>(value: &S) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// The canonical JSON value
    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Compact canonical JSON text
    pub fn canonical_form(&self) -> String {
        self.0.to_string()
    }

    /// SHA-256 (hex) of the canonical form
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_form().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_form() == other.canonical_form()
    }
}

// serde_json never yields NaN, so canonical equality is total.
impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_form().hash(state);
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Solution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::new)
    }
}

impl From<Value> for Solution {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Solution {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Solution {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Number(number) => Value::Number(canonical_number(number)),
        other => other,
    }
}

fn canonical_number(number: Number) -> Number {
    if number.is_f64() {
        if let Some(f) = number.as_f64() {
            if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER {
                return Number::from(f as i64);
            }
        }
    }
    number
}

/// Confidence a specialist attaches to its proposal (0.0 - 1.0)
///
/// Values outside the range, and non-finite values, are rejected both at
/// construction and when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;

    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(SdpError::InvalidConfidence(value));
        }
        // Fold -0.0 so equality agrees with the total ordering
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for Confidence {}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = SdpError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A solution proposed by one agent for one task
///
/// Immutable once built. Equality covers agent, solution, confidence and
/// reasoning; the creation timestamp is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    agent_id: String,
    solution: Solution,
    confidence: Confidence,
    reasoning: String,
    timestamp: DateTime<Utc>,
}

impl Proposal {
    /// Create a new proposal stamped with the current time
    pub fn new(
        agent_id: impl Into<String>,
        solution: impl Into<Solution>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            agent_id: agent_id.into(),
            solution: solution.into(),
            confidence: Confidence::new(confidence)?,
            reasoning: reasoning.into(),
            timestamp: Utc::now(),
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Check if this proposal has strictly higher confidence than another
    pub fn is_higher_confidence_than(&self, other: &Proposal) -> bool {
        self.confidence > other.confidence
    }

    /// Order two proposals by confidence alone
    pub fn cmp_confidence(&self, other: &Proposal) -> Ordering {
        self.confidence.cmp(&other.confidence)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PartialEq for Proposal {
    fn eq(&self, other: &Self) -> bool {
        self.agent_id == other.agent_id
            && self.confidence == other.confidence
            && self.reasoning == other.reasoning
            && self.solution == other.solution
    }
}

impl Eq for Proposal {}
