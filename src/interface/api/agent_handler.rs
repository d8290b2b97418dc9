//! Agent and call callback handlers

use super::dialing_handler::{failure, ApiResult, AppState};
use super::dto::{AgentReleaseResponse, ApiResponse, OutcomeRequest, OutcomeResponse};
use crate::domain::shared::value_objects::{AgentId, CallId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// Agent finished a call and is available again
pub async fn release_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<AgentId>,
) -> ApiResult<AgentReleaseResponse> {
    match state.agents.release(&agent_id).await {
        Ok(released) => {
            info!(agent_id = %agent_id, released, "API: Agent release");
            (
                StatusCode::OK,
                Json(ApiResponse::success(AgentReleaseResponse { agent_id, released })),
            )
        }
        Err(e) => failure("Failed to release agent", &e),
    }
}

/// Outcome callback for telephony integrations that report over HTTP
pub async fn report_outcome(
    State(state): State<AppState>,
    Path(call_id): Path<CallId>,
    Json(req): Json<OutcomeRequest>,
) -> ApiResult<OutcomeResponse> {
    info!(call_id = %call_id, outcome = %req.outcome, "API: Call outcome reported");

    match state.reporter.report(&call_id, req.outcome).await {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(OutcomeResponse { call_id, status })),
        ),
        Err(e) => failure("Failed to apply call outcome", &e),
    }
}
