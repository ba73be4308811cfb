//! API Models
//!
//! Request and response bodies for the HTTP endpoints, annotated for OpenAPI
//! generation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct OutboundCallPayload {
    /// Destination phone number.
    #[schema(example = "+15552223333")]
    pub to: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Message shape used towards clients.
    #[schema(example = "media_stream")]
    pub dialect: String,
    /// Whether `POST /make-outbound-call` is available.
    pub outbound_calls: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
    /// Upstream error payload, when one is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}
