//! Telephony boundary - where calls leave the dialer

use crate::domain::call::DialOutcome;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, CampaignId, PhoneNumber};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything an adapter needs to originate one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialRequest {
    pub call_id: CallId,
    pub campaign_id: CampaignId,
    pub destination: PhoneNumber,
    pub caller_id_number: String,
}

/// Capability to place a call and report how it went
///
/// Implementations must resolve every request within their own bound; the
/// dialer has no timeout of its own on calls in flight.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelephonyAdapter: Send + Sync {
    async fn place_call(&self, request: &DialRequest) -> Result<DialOutcome>;
}
