//! Supervisor: consults agents and turns their proposals into a decision

use futures::future::join_all;
use sdp_core::fail_open::fail_open;
use sdp_core::{Decision, Proposal, Result, SdpError, SynthesisSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentRegistry};
use crate::engine::RuleEngine;

/// Configuration for a supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Per-agent consultation timeout
    pub consult_timeout: Duration,
    /// Maximum agents consulted concurrently
    pub max_agents: usize,
    /// Shared deadline for a whole round (defaults to `consult_timeout`)
    pub round_deadline: Option<Duration>,
}

impl SupervisorConfig {
    pub fn new() -> Self {
        Self {
            consult_timeout: Duration::from_secs(30),
            max_agents: 5,
            round_deadline: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.consult_timeout = timeout;
        self
    }

    /// Concurrency cap, clamped to what a semaphore can hand out
    pub fn with_max_agents(mut self, max: usize) -> Self {
        self.max_agents = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn with_round_deadline(mut self, deadline: Duration) -> Self {
        self.round_deadline = Some(deadline);
        self
    }

    /// Effective deadline for a round
    pub fn round_deadline(&self) -> Duration {
        self.round_deadline.unwrap_or(self.consult_timeout)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&SynthesisSettings> for SupervisorConfig {
    fn from(settings: &SynthesisSettings) -> Self {
        let config = Self::new()
            .with_timeout(settings.consult_timeout())
            .with_max_agents(settings.max_concurrent_agents);
        match settings.round_deadline_secs {
            Some(secs) => config.with_round_deadline(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Availability of one registered agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_id: String,
    pub available: bool,
}

/// Coordinates specialist agents and applies the rule engine
///
/// A round moves Consulting → Synthesizing → Approved | Escalated, or fails
/// during consultation. Individual agent failures are absorbed; a round with
/// no usable proposal is an error; a round no rule can resolve is escalated.
pub struct Supervisor<T: Sync = Value> {
    config: SupervisorConfig,
    engine: RuleEngine,
    registry: RwLock<AgentRegistry<T>>,
}

impl<T: Sync> Supervisor<T> {
    pub fn new(engine: RuleEngine, config: SupervisorConfig) -> Self {
        Self {
            config,
            engine,
            registry: RwLock::new(AgentRegistry::new()),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Override the per-agent consultation timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.consult_timeout = timeout;
    }

    /// Register an agent; an existing registration with the same id is replaced
    ///
    /// Rounds already in flight keep the agent set they started with.
    pub async fn register_agent(&self, agent: Arc<dyn Agent<T>>) {
        let id = agent.id().to_string();
        if self.registry.write().await.register(agent).is_some() {
            info!("Replaced registration for agent {}", id);
        } else {
            debug!("Registered agent {}", id);
        }
    }

    /// Remove an agent; returns false when it was not registered
    pub async fn unregister_agent(&self, id: &str) -> bool {
        self.registry.write().await.unregister(id).is_some()
    }

    /// Registered agent ids in consultation order
    pub async fn agent_ids(&self) -> Vec<String> {
        let registry = self.registry.read().await;
        registry.ids().into_iter().map(str::to_string).collect()
    }

    /// Current availability of every registered agent
    pub async fn get_agent_status(&self) -> Vec<AgentStatus> {
        let agents = self.registry.read().await.snapshot();
        join_all(agents.iter().map(|agent| async move {
            AgentStatus {
                agent_id: agent.id().to_string(),
                available: agent.available().await,
            }
        }))
        .await
    }

    /// Gather proposals from every available agent
    pub async fn consult_agents(&self, task: &T) -> Result<Vec<Proposal>> {
        self.consult_agents_with_cancel(task, &CancellationToken::new())
            .await
    }

    /// Gather proposals, abandoning the round if `cancel` fires
    ///
    /// Agents are consulted concurrently (at most `max_agents` at a time)
    /// under one shared deadline. Proposals come back in registration order.
    ///
    /// The deadline starts before permits are handed out, so agents queued
    /// behind the cap spend the same budget while they wait. Under a tight
    /// cap the last agents in line can be skipped once the deadline passes.
    #[instrument(skip(self, task, cancel))]
    pub async fn consult_agents_with_cancel(
        &self,
        task: &T,
        cancel: &CancellationToken,
    ) -> Result<Vec<Proposal>> {
        let agents = self.registry.read().await.snapshot();
        if cancel.is_cancelled() {
            return Err(SdpError::Cancelled);
        }

        // Never more permits than agents in this round
        let permits = self.config.max_agents.clamp(1, agents.len().max(1));
        let limiter = Semaphore::new(permits);
        let deadline = Instant::now() + self.config.round_deadline();
        let consultations = agents
            .iter()
            .map(|agent| self.consult_one(agent.as_ref(), task, &limiter, deadline));

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Round cancelled during consultation of {} agents", agents.len());
                return Err(SdpError::Cancelled);
            }
            outcomes = join_all(consultations) => outcomes,
        };

        let proposals: Vec<Proposal> = outcomes.into_iter().flatten().collect();
        if proposals.is_empty() {
            return Err(SdpError::NoProposals);
        }

        info!("Collected {} proposals from agents", proposals.len());
        Ok(proposals)
    }

    /// Consult agents and synthesize their proposals into a decision
    pub async fn make_decision(&self, task: &T) -> Result<Decision> {
        self.make_decision_with_cancel(task, &CancellationToken::new())
            .await
    }

    /// Run one decision round under a cancellation signal
    ///
    /// Returns an error only when consultation fails or is cancelled, or a
    /// rule that claimed the proposals fails. Proposals that no rule can
    /// resolve produce an escalated decision, not an error.
    #[instrument(skip(self, task, cancel))]
    pub async fn make_decision_with_cancel(
        &self,
        task: &T,
        cancel: &CancellationToken,
    ) -> Result<Decision> {
        let round_id = Uuid::new_v4();

        let proposals = match self.consult_agents_with_cancel(task, cancel).await {
            Ok(proposals) => proposals,
            Err(SdpError::Cancelled) => return Err(SdpError::Cancelled),
            Err(e) => return Err(SdpError::Consultation(Box::new(e))),
        };

        match self.engine.execute(&proposals) {
            Ok(result) => {
                info!(%round_id, "Decision approved using rule '{}'", result.rule_name);
                Ok(Decision::approved(round_id, result))
            }
            Err(SdpError::CannotSynthesize) => {
                let reason = format!("Synthesis failed: {}", SdpError::CannotSynthesize);
                warn!(%round_id, "{}, escalating to human", reason);
                Ok(Decision::escalated(round_id, proposals, reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Consult a single agent; every failure is absorbed into `None`
    async fn consult_one(
        &self,
        agent: &dyn Agent<T>,
        task: &T,
        limiter: &Semaphore,
        deadline: Instant,
    ) -> Option<Proposal> {
        let _permit = limiter.acquire().await.ok()?;
        let agent_id = agent.id();

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!("Round deadline passed before agent {} was consulted", agent_id);
            return None;
        }

        match tokio::time::timeout(remaining, agent.available()).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Agent {} is not available, skipping", agent_id);
                return None;
            }
            Err(_) => {
                warn!("Agent {} did not answer its availability probe, skipping", agent_id);
                return None;
            }
        }

        let budget = deadline
            .saturating_duration_since(Instant::now())
            .min(self.config.consult_timeout);
        let operation = format!("Agent {} consultation", agent_id);

        let answer = fail_open(&operation, move || async move {
            match tokio::time::timeout(budget, agent.consult(task, budget)).await {
                Ok(result) => result,
                Err(_) => Err(SdpError::AgentTimeout(agent_id.to_string())),
            }
        })
        .await?;

        match answer {
            Some(proposal) => {
                info!(
                    "Received proposal from {} (confidence: {})",
                    agent_id,
                    proposal.confidence()
                );
                Some(proposal)
            }
            None => {
                debug!("Agent {} abstained", agent_id);
                None
            }
        }
    }
}

impl<T: Sync> std::fmt::Debug for Supervisor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
