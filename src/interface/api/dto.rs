//! API data transfer objects

use crate::application::{DialResult, DialingStats};
use crate::domain::call::{CallStatus, DialOutcome};
use crate::domain::campaign::Campaign;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::{AgentId, CallId, CampaignId};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            reason: None,
            error: None,
        }
    }

    pub fn error(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            reason: Some(reason.into()),
            error: Some(message.into()),
        }
    }

    /// Rejection that still carries a body, e.g. the stats of a campaign
    /// that could not be dialed
    pub fn rejected(reason: impl Into<String>, message: impl Into<String>, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::error(reason, message)
        }
    }

    /// Map a domain error to a status code and a body safe to show callers
    pub fn from_domain_error(e: &DomainError) -> (StatusCode, Self) {
        let status = match e {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DomainError::InvalidStateTransition(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if e.is_infrastructure() {
            "Internal server error".to_string()
        } else {
            e.to_string()
        };

        (status, Self::error(e.reason(), message))
    }
}

/// Result of a start request
#[derive(Debug, Serialize, Deserialize)]
pub struct DialRunResponse {
    #[serde(flatten)]
    pub result: DialResult,
    pub message: String,
    pub stats: DialingStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: bool,
    pub message: String,
    pub stats: DialingStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub campaign_id: CampaignId,
    pub stats: DialingStats,
}

/// One active campaign on the dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub name: String,
    pub product_type: Option<String>,
    pub stats: DialingStats,
}

impl CampaignSummary {
    pub fn new(campaign: Campaign, stats: DialingStats) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name,
            product_type: campaign.product_type,
            stats,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentReleaseResponse {
    pub agent_id: AgentId,
    pub released: bool,
}

/// Telephony callback body
#[derive(Debug, Serialize, Deserialize)]
pub struct OutcomeRequest {
    pub outcome: DialOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutcomeResponse {
    pub call_id: CallId,
    pub status: CallStatus,
}
