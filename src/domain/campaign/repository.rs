//! Campaign repository interface

use super::entity::Campaign;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CampaignId;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Find a campaign by ID
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>>;

    /// All campaigns currently flagged active
    async fn list_active(&self) -> Result<Vec<Campaign>>;
}
