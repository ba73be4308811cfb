//! Outbound Call Initiation
//!
//! Asks a telephony provider to dial a number and stream the call's audio to
//! the relay WebSocket.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// Credentials and endpoints for the telephony provider.
#[derive(Clone, Debug)]
pub struct TelephonyConfig {
    /// Provider endpoint that creates a call.
    pub api_url: String,
    pub app_id: String,
    pub app_secret: SecretString,
    /// Number the call is placed from.
    pub from_number: String,
    /// Public `wss://` URL of this relay's `/ws` endpoint.
    pub stream_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CallInitiationError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("telephony provider rejected the call with status {status}")]
    Provider { status: u16, body: String },
    #[error("failed to reach telephony provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("outbound calling is not configured")]
    NotConfigured,
}

/// Anything that can place an outbound call.
#[async_trait]
pub trait CallInitiator: Send + Sync {
    /// Places a call to `to` and returns the provider's response payload.
    async fn initiate_call(&self, to: &str) -> Result<Value, CallInitiationError>;
}

/// Returns the trimmed destination number, or `MissingParameter` if none was given.
pub fn validate_destination(to: Option<String>) -> Result<String, CallInitiationError> {
    match to.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => Ok(number.to_string()),
        _ => Err(CallInitiationError::MissingParameter("to")),
    }
}

#[derive(Serialize, Debug)]
struct CallRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    from: &'a str,
    to: &'a str,
    stream_url: &'a str,
}

/// Places calls through the provider's REST API.
pub struct HttpCallInitiator {
    http: reqwest::Client,
    config: TelephonyConfig,
}

impl HttpCallInitiator {
    pub fn new(config: TelephonyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn request_body<'a>(&'a self, to: &'a str) -> CallRequest<'a> {
        CallRequest {
            app_id: &self.config.app_id,
            app_secret: self.config.app_secret.expose_secret(),
            from: &self.config.from_number,
            to,
            stream_url: &self.config.stream_url,
        }
    }
}

#[async_trait]
impl CallInitiator for HttpCallInitiator {
    async fn initiate_call(&self, to: &str) -> Result<Value, CallInitiationError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .json(&self.request_body(to))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), %body, "Telephony provider rejected call");
            return Err(CallInitiationError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        info!(to, "Outbound call initiated");
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
