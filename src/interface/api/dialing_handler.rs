//! Predictive dialing API handlers

use super::dto::{ApiResponse, CampaignSummary, DialRunResponse, StatsResponse, StopResponse};
use crate::application::{DialerServices, DialingScheduler, OutcomeReporter, StatsAggregator};
use crate::domain::agent::AgentPool;
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CampaignId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub scheduler: Arc<DialingScheduler>,
    pub stats: Arc<StatsAggregator>,
    pub agents: Arc<AgentPool>,
    pub reporter: Arc<OutcomeReporter>,
}

impl AppState {
    pub fn from_services(services: &DialerServices) -> Self {
        Self {
            campaigns: services.campaigns.clone(),
            scheduler: services.scheduler.clone(),
            stats: services.stats.clone(),
            agents: services.agents.clone(),
            reporter: services.reporter.clone(),
        }
    }

    pub(crate) async fn load_campaign(&self, id: &CampaignId) -> Result<Campaign> {
        self.campaigns
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Campaign {}", id)))
    }
}

pub type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

pub(crate) fn failure<T>(context: &str, e: &DomainError) -> ApiResult<T> {
    if e.is_infrastructure() {
        error!(error = %e, "API: {}", context);
    } else {
        warn!(error = %e, "API: {}", context);
    }
    let (status, body) = ApiResponse::from_domain_error(e);
    (status, Json(body))
}

/// Run one dialing pass for the campaign
pub async fn start_dialing(
    State(state): State<AppState>,
    Path(campaign_id): Path<CampaignId>,
) -> ApiResult<DialRunResponse> {
    info!(campaign_id = %campaign_id, "API: Starting predictive dialing");

    let outcome = async {
        let campaign = state.load_campaign(&campaign_id).await?;
        let result = state.scheduler.run(&campaign).await?;
        let stats = state.stats.snapshot(&campaign_id).await?;
        Ok::<_, DomainError>((result, stats))
    }
    .await;

    match outcome {
        Ok((result, stats)) => {
            let response = DialRunResponse {
                result,
                message: result.message(),
                stats,
            };

            if result.is_started() {
                (StatusCode::OK, Json(ApiResponse::success(response)))
            } else {
                info!(campaign_id = %campaign_id, result = %result, "API: Predictive dialing not started");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::rejected(result.as_str(), result.message(), response)),
                )
            }
        }
        Err(e) => failure("Failed to start predictive dialing", &e),
    }
}

/// Cancel the campaign's calls that are still dialing
pub async fn stop_dialing(
    State(state): State<AppState>,
    Path(campaign_id): Path<CampaignId>,
) -> ApiResult<StopResponse> {
    info!(campaign_id = %campaign_id, "API: Stopping predictive dialing");

    let outcome = async {
        let campaign = state.load_campaign(&campaign_id).await?;
        let stopped = state.scheduler.stop(&campaign).await?;
        let stats = state.stats.snapshot(&campaign_id).await?;
        Ok::<_, DomainError>(StopResponse {
            stopped,
            message: "Predictive dialing stopped".to_string(),
            stats,
        })
    }
    .await;

    match outcome {
        Ok(response) => (StatusCode::OK, Json(ApiResponse::success(response))),
        Err(e) => failure("Failed to stop predictive dialing", &e),
    }
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(campaign_id): Path<CampaignId>,
) -> ApiResult<StatsResponse> {
    let outcome = async {
        state.load_campaign(&campaign_id).await?;
        state.stats.snapshot(&campaign_id).await
    }
    .await;

    match outcome {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(StatsResponse { campaign_id, stats })),
        ),
        Err(e) => failure("Failed to get stats", &e),
    }
}

/// Every active campaign with its current stats
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Vec<CampaignSummary>> {
    let outcome = async {
        let campaigns = state.campaigns.list_active().await?;
        let mut summaries = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let stats = state.stats.snapshot(&campaign.id).await?;
            summaries.push(CampaignSummary::new(campaign, stats));
        }
        Ok::<_, DomainError>(summaries)
    }
    .await;

    match outcome {
        Ok(summaries) => (StatusCode::OK, Json(ApiResponse::success(summaries))),
        Err(e) => failure("Failed to build dashboard", &e),
    }
}
