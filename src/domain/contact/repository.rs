//! Contact repository interface

use super::entity::Contact;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CampaignId, ContactId};
use async_trait::async_trait;

/// Contact counts for one campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactCounts {
    pub total: u64,
    pub dialed: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Atomically take up to `limit` undialed contacts of the campaign, in
    /// insertion order, and mark them dialed
    ///
    /// Stored contacts that cannot be turned into a dialable [`Contact`] are
    /// left undialed, flagged unreachable and skipped by later claims.
    async fn claim_undialed(&self, campaign_id: &CampaignId, limit: usize) -> Result<Vec<Contact>>;

    /// Undo a claim that produced no call
    ///
    /// Returns `Ok(false)` and leaves the contact alone if it is not dialed
    /// or already has a call attached.
    async fn release_claim(&self, id: &ContactId) -> Result<bool>;

    /// `total` excludes contacts flagged unreachable
    async fn counts(&self, campaign_id: &CampaignId) -> Result<ContactCounts>;

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>>;
}
