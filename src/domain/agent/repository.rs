//! Agent repository interface

use super::entity::{Agent, AgentStatus};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::AgentId;
use async_trait::async_trait;

/// Persistence port for agents
///
/// `claim_idle` and `release` must be single atomic operations against the
/// store: two concurrent claims never return the same agent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Number of agents currently in `status`
    async fn count_by_status(&self, status: AgentStatus) -> Result<u64>;

    /// Atomically move one idle agent to busy and return it
    ///
    /// `selection_key` decides which idle agent is taken when several are
    /// free; the same key over the same idle set picks the same agent.
    async fn claim_idle(&self, selection_key: u64) -> Result<Option<Agent>>;

    /// Move a busy agent back to idle. `Ok(false)` if it was already idle.
    async fn release(&self, id: &AgentId) -> Result<bool>;

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>>;
}
