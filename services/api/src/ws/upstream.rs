//! Handles the WebSocket connection to the conversational agent.

use super::session::{SessionError, Side};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use relay_core::agent::{AgentConfig, AgentMessage};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as WsMessage,
};
use tracing::{debug, info};

type AgentStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type AgentSink = SplitSink<AgentStream, WsMessage>;
pub(crate) type AgentSource = SplitStream<AgentStream>;

/// Opens the agent conversation and, if a greeting is configured, starts it.
///
/// The handshake is bounded by `connect_timeout` when one is set.
pub(crate) async fn connect(
    agent: &AgentConfig,
    connect_timeout: Option<Duration>,
) -> Result<(AgentSink, AgentSource), SessionError> {
    let url = agent
        .conversation_url()
        .map_err(|e| SessionError::InvalidEndpoint(e.to_string()))?;

    debug!(%url, "Connecting to agent");
    let handshake = connect_async(url.as_str());
    let (ws_stream, _) = match connect_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| SessionError::IdleTimeout {
                side: Side::Agent,
                after: limit,
            })?,
        None => handshake.await,
    }
    .map_err(SessionError::Connect)?;
    info!(agent_id = %agent.agent_id, "Connected to agent");

    let (mut agent_tx, agent_rx) = ws_stream.split();

    if let Some(start) = agent.conversation_start() {
        send(&mut agent_tx, &start).await?;
        debug!("Sent conversation start to agent");
    }

    Ok((agent_tx, agent_rx))
}

/// Serializes and sends one message to the agent.
pub(crate) async fn send(agent_tx: &mut AgentSink, msg: &AgentMessage) -> Result<(), SessionError> {
    let serialized = msg.encode()?;
    agent_tx.send(WsMessage::Text(serialized.into())).await?;
    Ok(())
}
