//! Manages the lifecycle of one relay session: a client socket paired with an
//! agent socket.

use super::upstream::{self, AgentSink, AgentSource};
use crate::{config::SessionLimits, state::AppState};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, Stream, StreamExt,
    stream::{SplitSink, SplitStream},
};
use relay_core::{
    agent::{AgentConfig, AgentEvent},
    check_frame_size,
    client::ClientEvent,
    translate::{AgentAction, ClientAction, Translator},
};
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, protocol::Message as WsMessage};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

type ClientSink = SplitSink<WebSocket, Message>;
type ClientSource = SplitStream<WebSocket>;

/// Which end of the relay a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Agent,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Agent => write!(f, "agent"),
        }
    }
}

/// Errors that end a relay session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid agent endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("could not connect to agent: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("agent connection failed: {0}")]
    Agent(#[from] tungstenite::Error),
    #[error("client connection failed: {0}")]
    Client(#[from] axum::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{side} sent nothing for {after:?}")]
    IdleTimeout { side: Side, after: Duration },
}

/// How a session that ended without error finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The agent closed its connection.
    AgentClosed,
    /// The client closed its connection.
    ClientClosed,
    /// The client sent `stop`.
    ClientStopped,
}

/// Axum handler to upgrade an HTTP connection to a relay WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.max_message_size(state.config.limits.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(name = "relay_session", skip_all, fields(session_id = %Uuid::new_v4()))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");
    let config = &state.config;

    let session = match RelaySession::start(
        socket,
        &config.agent,
        Translator::new(config.dialect),
        config.limits.clone(),
    )
    .await
    {
        Ok(session) => session,
        // Already reported to the client and logged.
        Err(_) => return,
    };

    match session.run().await {
        Ok(end) => info!(?end, "Relay session finished"),
        Err(e) => error!(error = %e, "Relay session terminated with error"),
    }
}

/// One client connection and one agent connection, relayed for the lifetime
/// of a call.
pub struct RelaySession {
    client_tx: ClientSink,
    client_rx: ClientSource,
    agent_tx: AgentSink,
    agent_rx: AgentSource,
    translator: Translator,
    limits: SessionLimits,
}

impl RelaySession {
    /// Connects to the agent on behalf of a freshly accepted client.
    ///
    /// If the agent cannot be reached, the client is told why and its socket
    /// is closed before the error is returned.
    pub async fn start(
        socket: WebSocket,
        agent: &AgentConfig,
        translator: Translator,
        limits: SessionLimits,
    ) -> Result<Self, SessionError> {
        let (mut client_tx, client_rx) = socket.split();

        match upstream::connect(agent, limits.idle_timeout).await {
            Ok((agent_tx, agent_rx)) => Ok(Self {
                client_tx,
                client_rx,
                agent_tx,
                agent_rx,
                translator,
                limits,
            }),
            Err(e) => {
                error!(error = %e, "Failed to open agent connection");
                close_client(&mut client_tx, Some(&e)).await;
                Err(e)
            }
        }
    }

    /// Pumps frames in both directions until either side finishes, then
    /// closes both connections.
    pub async fn run(self) -> Result<SessionEnd, SessionError> {
        let Self {
            mut client_tx,
            mut client_rx,
            agent_tx,
            mut agent_rx,
            translator,
            limits,
        } = self;
        info!(dialect = %translator.dialect(), "Streaming");

        // Both loops write to the agent: audio from the client, pongs from the agent loop.
        let agent_tx = Mutex::new(agent_tx);

        // Whichever loop finishes first drops the other.
        let outcome = tokio::select! {
            result = agent_to_client(&mut agent_rx, &mut client_tx, &agent_tx, translator, &limits) => result,
            result = client_to_agent(&mut client_rx, &agent_tx, translator, &limits) => result,
        };

        let mut agent_tx = agent_tx.into_inner();
        if let Err(e) = agent_tx.close().await {
            debug!(error = %e, "Agent connection already closed");
        }
        close_client(&mut client_tx, outcome.as_ref().err()).await;

        outcome
    }
}

/// Waits for the next frame, giving up after the idle limit.
async fn next_frame<S>(
    stream: &mut S,
    idle_timeout: Option<Duration>,
    side: Side,
) -> Result<Option<S::Item>, SessionError>
where
    S: Stream + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| SessionError::IdleTimeout { side, after: limit }),
        None => Ok(stream.next().await),
    }
}

async fn agent_to_client(
    agent_rx: &mut AgentSource,
    client_tx: &mut ClientSink,
    agent_tx: &Mutex<AgentSink>,
    translator: Translator,
    limits: &SessionLimits,
) -> Result<SessionEnd, SessionError> {
    while let Some(frame) = next_frame(agent_rx, limits.idle_timeout, Side::Agent).await? {
        let text = match frame? {
            WsMessage::Text(text) => text,
            WsMessage::Close(close_frame) => {
                info!(?close_frame, "Agent closed the connection");
                return Ok(SessionEnd::AgentClosed);
            }
            _ => continue,
        };

        let event = match check_frame_size(text.as_str(), limits.max_message_bytes)
            .and_then(|()| AgentEvent::decode(text.as_str()))
        {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable agent frame");
                continue;
            }
        };

        match translator.on_agent_event(event) {
            AgentAction::ToClient(command) => {
                client_tx
                    .send(Message::Text(command.encode()?.into()))
                    .await?;
                trace!(event = command.event, "Forwarded agent event to client");
            }
            AgentAction::ReplyToAgent(reply) => {
                upstream::send(&mut *agent_tx.lock().await, &reply).await?;
            }
            AgentAction::Ignore => {}
        }
    }

    info!("Agent stream ended");
    Ok(SessionEnd::AgentClosed)
}

async fn client_to_agent(
    client_rx: &mut ClientSource,
    agent_tx: &Mutex<AgentSink>,
    translator: Translator,
    limits: &SessionLimits,
) -> Result<SessionEnd, SessionError> {
    while let Some(frame) = next_frame(client_rx, limits.idle_timeout, Side::Client).await? {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(close_frame) => {
                info!(?close_frame, "Client closed the connection");
                return Ok(SessionEnd::ClientClosed);
            }
            Message::Binary(_) => {
                debug!("Ignoring binary frame from client");
                continue;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };
        trace!(frame = %text.as_str(), "Client frame");

        let event = match ClientEvent::decode(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable client frame");
                continue;
            }
        };

        match translator.on_client_event(event) {
            ClientAction::ForwardToAgent(msg) => {
                upstream::send(&mut *agent_tx.lock().await, &msg).await?;
            }
            ClientAction::Stop => {
                info!("Client requested stop. Closing agent connection.");
                if let Err(e) = agent_tx.lock().await.close().await {
                    warn!(error = %e, "Failed to close agent connection cleanly");
                }
                return Ok(SessionEnd::ClientStopped);
            }
            ClientAction::Ignore => {}
        }
    }

    info!("Client stream ended");
    Ok(SessionEnd::ClientClosed)
}

/// Best-effort: reports `error` to the client, if any, then closes its socket.
async fn close_client(client_tx: &mut ClientSink, error: Option<&SessionError>) {
    if let Some(e) = error {
        let notice = Message::Text(format!("Error: {}", e).into());
        if client_tx.send(notice).await.is_err() {
            debug!("Could not deliver error notice to client");
        }
    }
    if let Err(e) = client_tx.close().await {
        debug!(error = %e, "Client connection already closed");
    }
    info!("Client connection closed");
}
