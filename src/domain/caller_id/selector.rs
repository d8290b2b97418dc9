//! Caller-id selection for new calls

use super::entity::CallerId;
use super::repository::CallerIdRepository;
use crate::domain::shared::random::RandomSource;
use crate::domain::shared::result::Result;
use std::sync::Arc;

/// Picks an active caller-id uniformly at random
///
/// Caller-ids are shared, not claimed, so no atomicity is needed here.
pub struct CallerIdSelector {
    repository: Arc<dyn CallerIdRepository>,
    rng: Arc<RandomSource>,
}

impl CallerIdSelector {
    pub fn new(repository: Arc<dyn CallerIdRepository>, rng: Arc<RandomSource>) -> Self {
        Self { repository, rng }
    }

    /// `None` when no caller-id is active
    pub async fn select(&self) -> Result<Option<CallerId>> {
        let mut active = self.repository.list_active().await?;
        match self.rng.pick_index(active.len()).await {
            Some(index) => Ok(Some(active.swap_remove(index))),
            None => Ok(None),
        }
    }
}
