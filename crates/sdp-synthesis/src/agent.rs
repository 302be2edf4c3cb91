//! Agent capability and registry
//!
//! The supervisor never looks inside an agent. Anything that can report
//! liveness and answer a task with a proposal (an LLM call, a subprocess,
//! a remote service) plugs in through [`Agent`].

use async_trait::async_trait;
use sdp_core::{Proposal, Result, SdpError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A specialist that can be consulted for a proposal
///
/// `T` is the caller's task payload; the core passes it through untouched.
#[async_trait]
pub trait Agent<T: Sync = Value>: Send + Sync {
    /// Agent identifier (unique within a registry)
    fn id(&self) -> &str;

    /// Liveness probe, checked before each consultation
    async fn available(&self) -> bool;

    /// Produce a proposal for the task within `timeout`
    ///
    /// `Ok(None)` means the agent abstains. The supervisor also enforces
    /// `timeout`, so an implementation that overruns is abandoned.
    async fn consult(&self, task: &T, timeout: Duration) -> Result<Option<Proposal>>;
}

/// Agents in registration order, indexed by id
///
/// Registering an id that is already present replaces that agent in place,
/// keeping its original position.
pub struct AgentRegistry<T: Sync = Value> {
    agents: Vec<Arc<dyn Agent<T>>>,
    index: HashMap<String, usize>,
}

impl<T: Sync> AgentRegistry<T> {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register an agent, returning the one it replaced
    pub fn register(&mut self, agent: Arc<dyn Agent<T>>) -> Option<Arc<dyn Agent<T>>> {
        match self.index.get(agent.id()) {
            Some(&slot) => Some(std::mem::replace(&mut self.agents[slot], agent)),
            None => {
                self.index.insert(agent.id().to_string(), self.agents.len());
                self.agents.push(agent);
                None
            }
        }
    }

    /// Remove an agent by id
    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn Agent<T>>> {
        let slot = self.index.remove(id)?;
        let removed = self.agents.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Agent<T>>> {
        self.index.get(id).map(|&slot| &self.agents[slot])
    }

    /// Agent ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Agent<T>>> {
        self.agents.iter()
    }

    /// Clone the current agent list so a round can run without holding the registry
    pub fn snapshot(&self) -> Vec<Arc<dyn Agent<T>>> {
        self.agents.clone()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl<T: Sync> Default for AgentRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sync> std::fmt::Debug for AgentRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.ids())
            .finish()
    }
}

/// Scripted agent for testing
///
/// Answers every task with the same proposal (or abstains), optionally
/// after a delay. The delay ignores the timeout it is handed, which makes
/// it a convenient stand-in for a non-cooperating agent.
#[derive(Debug, Clone)]
pub struct MockAgent {
    id: String,
    available: bool,
    proposal: Option<Proposal>,
    failure: Option<String>,
    delay: Option<Duration>,
    consultations: Arc<AtomicUsize>,
}

impl MockAgent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            available: true,
            proposal: None,
            failure: None,
            delay: None,
            consultations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_proposal(mut self, proposal: Proposal) -> Self {
        self.proposal = Some(proposal);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `consult` was called (shared across clones)
    pub fn consultations(&self) -> usize {
        self.consultations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Sync> Agent<T> for MockAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn available(&self) -> bool {
        self.available
    }

    async fn consult(&self, _task: &T, _timeout: Duration) -> Result<Option<Proposal>> {
        self.consultations.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(reason) => Err(SdpError::AgentConsult {
                agent: self.id.clone(),
                reason: reason.clone(),
            }),
            None => Ok(self.proposal.clone()),
        }
    }
}
