//! Call repository interface

use crate::domain::call::aggregate::Call;
use crate::domain::call::value_object::CallStatus;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, CampaignId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Number of calls of a campaign in one status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStatusCount {
    pub status: CallStatus,
    pub count: u64,
}

/// Repository interface for Call aggregate
///
/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Insert a new call
    async fn create(&self, call: &Call) -> Result<()>;

    /// Find a call by its ID
    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>>;

    /// Persist `call` only if the stored status is still `expected`
    ///
    /// Returns `Ok(false)` when another writer moved the call first.
    async fn save_transition(&self, call: &Call, expected: CallStatus) -> Result<bool>;

    /// Move every `dialing` call of the campaign to `cancelled`
    async fn cancel_dialing(&self, campaign_id: &CampaignId, ended_at: DateTime<Utc>) -> Result<u64>;

    /// Per-status counts for a campaign; statuses with no calls may be omitted
    async fn status_counts(&self, campaign_id: &CampaignId) -> Result<Vec<CallStatusCount>>;

    /// Calls of a campaign, oldest first
    async fn list_by_campaign(&self, campaign_id: &CampaignId) -> Result<Vec<Call>>;
}
