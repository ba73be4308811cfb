//! Messages exchanged with the inbound client (phone media stream or browser).

use crate::DecodeError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Events received from the client.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Stream handshake; carries nothing the relay needs.
    Connected,
    /// Stream metadata sent once before the first media frame.
    Start,
    /// A chunk of caller audio.
    Media { media: MediaPayload },
    /// The client is done; the session should end.
    Stop,
    #[serde(other)]
    Unknown,
}

impl ClientEvent {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediaPayload {
    /// Base64 audio, passed through untouched.
    pub payload: String,
}

/// A message for the client, already shaped for its dialect.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClientCommand {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaPayload>,
}

impl ClientCommand {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The naming convention the client expects for outgoing audio and clear events.
///
/// Both dialects decode inbound events the same way; only the names of the
/// events the relay sends back differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientDialect {
    /// `{"event":"media",...}` and `{"event":"clear"}`.
    #[default]
    MediaStream,
    /// `{"event":"playAudio",...}` and `{"event":"clearAudio"}`.
    PlayAudio,
}

impl ClientDialect {
    pub fn audio(self, payload: String) -> ClientCommand {
        let event = match self {
            ClientDialect::MediaStream => "media",
            ClientDialect::PlayAudio => "playAudio",
        };
        ClientCommand {
            event,
            media: Some(MediaPayload { payload }),
        }
    }

    pub fn clear(self) -> ClientCommand {
        let event = match self {
            ClientDialect::MediaStream => "clear",
            ClientDialect::PlayAudio => "clearAudio",
        };
        ClientCommand { event, media: None }
    }
}

impl fmt::Display for ClientDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientDialect::MediaStream => write!(f, "media_stream"),
            ClientDialect::PlayAudio => write!(f, "play_audio"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown client dialect '{0}' (expected 'media_stream' or 'play_audio')")]
pub struct UnknownDialect(pub String);

impl FromStr for ClientDialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "media_stream" | "media" => Ok(ClientDialect::MediaStream),
            "play_audio" | "playaudio" => Ok(ClientDialect::PlayAudio),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
