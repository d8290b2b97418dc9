//! Caller-id repository interface

use super::entity::CallerId;
use crate::domain::shared::result::Result;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallerIdRepository: Send + Sync {
    /// Active caller-ids in a stable order
    async fn list_active(&self) -> Result<Vec<CallerId>>;
}
