//! Per-frame translation rules between the client and the agent.

use crate::{
    agent::{AgentEvent, AgentMessage},
    client::{ClientCommand, ClientDialect, ClientEvent},
};
use tracing::{debug, info};

/// What to do with an event received from the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Send this to the client.
    ToClient(ClientCommand),
    /// Answer the agent directly.
    ReplyToAgent(AgentMessage),
    Ignore,
}

/// What to do with an event received from the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    ForwardToAgent(AgentMessage),
    /// Close the agent connection and end the session.
    Stop,
    Ignore,
}

/// Maps events from one side onto messages for the other, shaped for a
/// particular client dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    dialect: ClientDialect,
}

impl Translator {
    pub fn new(dialect: ClientDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> ClientDialect {
        self.dialect
    }

    pub fn on_agent_event(&self, event: AgentEvent) -> AgentAction {
        match event {
            AgentEvent::Audio { audio_event } => {
                AgentAction::ToClient(self.dialect.audio(audio_event.audio_base_64))
            }
            AgentEvent::Interruption { .. } => AgentAction::ToClient(self.dialect.clear()),
            AgentEvent::Ping { ping_event } => {
                AgentAction::ReplyToAgent(AgentMessage::pong(ping_event.event_id))
            }
            AgentEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event: meta,
            } => {
                info!(
                    conversation_id = %meta.conversation_id,
                    audio_format = ?meta.agent_output_audio_format,
                    "Agent conversation started"
                );
                AgentAction::Ignore
            }
            AgentEvent::UserTranscript {
                user_transcription_event,
            } => {
                info!(transcript = %user_transcription_event.user_transcript, "Caller said");
                AgentAction::Ignore
            }
            AgentEvent::AgentResponse {
                agent_response_event,
            } => {
                info!(response = %agent_response_event.agent_response, "Agent replied");
                AgentAction::Ignore
            }
            AgentEvent::Other => {
                debug!("Ignoring unhandled agent event");
                AgentAction::Ignore
            }
        }
    }

    pub fn on_client_event(&self, event: ClientEvent) -> ClientAction {
        match event {
            ClientEvent::Media { media } => ClientAction::ForwardToAgent(AgentMessage::UserAudioChunk {
                user_audio_chunk: media.payload,
            }),
            ClientEvent::Stop => ClientAction::Stop,
            ClientEvent::Connected | ClientEvent::Start => {
                info!("Client media stream handshake received");
                ClientAction::Ignore
            }
            ClientEvent::Unknown => {
                debug!("Ignoring unhandled client event");
                ClientAction::Ignore
            }
        }
    }
}
