//! Conversational Agent Protocol
//!
//! Messages exchanged with the upstream ElevenLabs ConvAI WebSocket, plus the
//! endpoint configuration needed to open that connection.

use crate::DecodeError;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_AGENT_ENDPOINT: &str = "wss://api.elevenlabs.io/v1/convai/conversation";
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// Where and how to reach the conversational agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Base WebSocket URL of the conversation endpoint.
    pub endpoint: String,
    /// Identifier of the agent to talk to.
    pub agent_id: String,
    /// Text sent with the conversation-start message. `None` skips it.
    pub greeting: Option<String>,
}

impl AgentConfig {
    /// Builds the full conversation URL, with `agent_id` as a query parameter.
    pub fn conversation_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(&self.endpoint, &[("agent_id", self.agent_id.as_str())])
    }

    /// The first message to send once connected, if a greeting is configured.
    pub fn conversation_start(&self) -> Option<AgentMessage> {
        self.greeting
            .as_ref()
            .map(|text| AgentMessage::ConversationStart {
                text: text.clone(),
                start_conversation: true,
            })
    }
}

/// Events received from the agent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ConversationInitiationMetadata {
        conversation_initiation_metadata_event: ConversationMetadata,
    },
    /// A chunk of synthesized speech for the caller.
    Audio { audio_event: AudioEvent },
    /// The caller started talking over the agent; buffered audio must go.
    Interruption {
        #[serde(default)]
        interruption_event: Option<InterruptionEvent>,
    },
    /// Keep-alive challenge; must be answered with a `pong` carrying the same id.
    Ping { ping_event: PingEvent },
    UserTranscript {
        user_transcription_event: UserTranscription,
    },
    AgentResponse {
        agent_response_event: AgentResponse,
    },
    #[serde(other)]
    Other,
}

impl AgentEvent {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationMetadata {
    pub conversation_id: String,
    #[serde(default)]
    pub agent_output_audio_format: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AudioEvent {
    pub audio_base_64: String,
    #[serde(default)]
    pub event_id: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InterruptionEvent {
    #[serde(default)]
    pub event_id: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PingEvent {
    pub event_id: u64,
    #[serde(default)]
    pub ping_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserTranscription {
    pub user_transcript: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub agent_response: String,
}

/// Messages sent to the agent.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AgentMessage {
    ConversationStart {
        text: String,
        start_conversation: bool,
    },
    UserAudioChunk {
        user_audio_chunk: String,
    },
    Control(ControlMessage),
}

/// Agent messages that carry a `type` tag.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Pong { event_id: u64 },
}

impl AgentMessage {
    pub fn pong(event_id: u64) -> Self {
        AgentMessage::Control(ControlMessage::Pong { event_id })
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
