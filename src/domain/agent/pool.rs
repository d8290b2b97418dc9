//! Agent pool - claim/release of idle agents

use super::entity::{Agent, AgentStatus};
use super::repository::AgentRepository;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::random::RandomSource;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::AgentId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Process-wide view of agent availability
///
/// Selection among several idle agents is uniform-random, driven by the
/// injected [`RandomSource`]. Fairness across agents is not attempted.
pub struct AgentPool {
    repository: Arc<dyn AgentRepository>,
    rng: Arc<RandomSource>,
}

impl AgentPool {
    pub fn new(repository: Arc<dyn AgentRepository>, rng: Arc<RandomSource>) -> Self {
        Self { repository, rng }
    }

    /// Idle agents at the time of the read. May be stale as soon as it returns.
    pub async fn count_idle(&self) -> Result<usize> {
        let count = self.repository.count_by_status(AgentStatus::Idle).await?;
        Ok(count as usize)
    }

    pub async fn count_busy(&self) -> Result<usize> {
        let count = self.repository.count_by_status(AgentStatus::Busy).await?;
        Ok(count as usize)
    }

    /// Claim one idle agent, or `None` if none is idle right now
    pub async fn claim_random_idle(&self) -> Result<Option<Agent>> {
        let key = self.rng.next_u64().await;
        let agent = self.repository.claim_idle(key).await?;

        match &agent {
            Some(agent) => debug!(agent_id = %agent.id, extension = %agent.extension, "Agent claimed"),
            None => debug!("No idle agent to claim"),
        }

        Ok(agent)
    }

    /// Return an agent to the idle set
    ///
    /// Releasing an agent that is already idle is a no-op and reports `false`.
    pub async fn release(&self, id: &AgentId) -> Result<bool> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Agent {}", id)));
        }

        let released = self.repository.release(id).await?;
        if released {
            debug!(agent_id = %id, "Agent released");
        } else {
            warn!(agent_id = %id, "Release requested for agent that is already idle");
        }

        Ok(released)
    }
}
