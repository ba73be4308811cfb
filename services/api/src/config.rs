use relay_core::{
    agent::{AgentConfig, DEFAULT_AGENT_ENDPOINT, DEFAULT_GREETING},
    client::ClientDialect,
    telephony::TelephonyConfig,
};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Bounds applied to every relay session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLimits {
    /// Largest text frame accepted from either side.
    pub max_message_bytes: usize,
    /// How long either side may stay silent. `None` means forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            idle_timeout: Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub agent: AgentConfig,
    pub dialect: ClientDialect,
    pub limits: SessionLimits,
    /// Present only when outbound calling is configured.
    pub telephony: Option<TelephonyConfig>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, ConfigError> {
    var(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8500".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let agent = AgentConfig {
            endpoint: var("AGENT_WS_URL").unwrap_or_else(|| DEFAULT_AGENT_ENDPOINT.to_string()),
            agent_id: required("ELEVENLABS_AGENT_ID")?,
            // An explicitly empty greeting disables the conversation-start message.
            greeting: match std::env::var("AGENT_GREETING") {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(text),
                Err(_) => Some(DEFAULT_GREETING.to_string()),
            },
        };
        agent
            .conversation_url()
            .map_err(|e| ConfigError::InvalidValue("AGENT_WS_URL".to_string(), e.to_string()))?;

        let dialect = match var("CLIENT_DIALECT") {
            Some(raw) => raw
                .parse::<ClientDialect>()
                .map_err(|e| ConfigError::InvalidValue("CLIENT_DIALECT".to_string(), e.to_string()))?,
            None => ClientDialect::default(),
        };

        let max_message_bytes = parse_number("MAX_MESSAGE_BYTES", DEFAULT_MAX_MESSAGE_BYTES)?;
        if max_message_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_MESSAGE_BYTES".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let idle_secs = parse_number("SESSION_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?;
        let limits = SessionLimits {
            max_message_bytes,
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
        };

        let telephony = Self::telephony_from_env()?;

        Ok(Self {
            bind_address,
            log_level,
            agent,
            dialect,
            limits,
            telephony,
        })
    }

    /// Outbound calling is enabled by the three provider credentials; setting
    /// only some of them is a mistake worth failing on.
    fn telephony_from_env() -> Result<Option<TelephonyConfig>, ConfigError> {
        let app_id = var("TELEPHONY_APP_ID");
        let app_secret = var("TELEPHONY_APP_SECRET");
        let from_number = var("TELEPHONY_FROM_NUMBER");

        let (app_id, app_secret, from_number) = match (app_id, app_secret, from_number) {
            (None, None, None) => return Ok(None),
            (Some(id), Some(secret), Some(from)) => (id, secret, from),
            (id, secret, _) => {
                let missing = if id.is_none() {
                    "TELEPHONY_APP_ID"
                } else if secret.is_none() {
                    "TELEPHONY_APP_SECRET"
                } else {
                    "TELEPHONY_FROM_NUMBER"
                };
                return Err(ConfigError::MissingVar(missing.to_string()));
            }
        };

        Ok(Some(TelephonyConfig {
            api_url: required("TELEPHONY_API_URL")?,
            app_id,
            app_secret: SecretString::from(app_secret),
            from_number,
            stream_url: required("RELAY_STREAM_URL")?,
        }))
    }
}
