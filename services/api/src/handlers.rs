//! Axum Handlers for the REST API
//!
//! Readiness probes and the outbound call trigger. Handlers carry `utoipa`
//! annotations for OpenAPI generation.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use relay_core::telephony::{CallInitiationError, validate_destination};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{ErrorResponse, HealthResponse, OutboundCallPayload},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    ServiceUnavailable(String),
    /// The telephony provider could not place the call.
    CallFailed {
        message: String,
        detail: Option<Value>,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message,
                    detail: None,
                }),
            )
                .into_response(),
            ApiError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    message,
                    detail: None,
                }),
            )
                .into_response(),
            ApiError::CallFailed { message, detail } => {
                error!(%message, ?detail, "Outbound call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message, detail }),
                )
                    .into_response()
            }
        }
    }
}

impl From<CallInitiationError> for ApiError {
    fn from(err: CallInitiationError) -> Self {
        let message = err.to_string();
        match err {
            CallInitiationError::MissingParameter(_) => ApiError::BadRequest(message),
            CallInitiationError::NotConfigured => ApiError::ServiceUnavailable(message),
            CallInitiationError::Provider { body, .. } => ApiError::CallFailed {
                message,
                detail: Some(serde_json::from_str(&body).unwrap_or(Value::String(body))),
            },
            CallInitiationError::Transport(_) => ApiError::CallFailed {
                message,
                detail: None,
            },
        }
    }
}

/// Plain-text readiness message.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Server is ready", body = String)
    )
)]
pub async fn root() -> &'static str {
    "ElevenLabs WebSocket relay is ready."
}

/// Structured health report.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        dialect: state.config.dialect.to_string(),
        outbound_calls: state.call_initiator.is_some(),
    })
}

/// Place an outbound call whose audio is streamed to this relay.
#[utoipa::path(
    post,
    path = "/make-outbound-call",
    request_body = OutboundCallPayload,
    responses(
        (status = 200, description = "Call placed; provider response returned verbatim"),
        (status = 400, description = "Missing destination number", body = ErrorResponse),
        (status = 500, description = "Telephony provider error", body = ErrorResponse),
        (status = 503, description = "Outbound calling not configured", body = ErrorResponse)
    )
)]
pub async fn make_outbound_call(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OutboundCallPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected outbound call request body");
        ApiError::BadRequest(rejection.body_text())
    })?;
    let to = validate_destination(payload.to)?;

    let initiator = state
        .call_initiator
        .as_ref()
        .ok_or(CallInitiationError::NotConfigured)?;

    info!(%to, "Placing outbound call");
    let response = initiator.initiate_call(&to).await?;
    Ok(Json(response))
}
