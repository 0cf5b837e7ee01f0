//! TCP transport
//!
//! One task per connection. The reader half decodes client messages and
//! forwards them to the session; after a successful join a writer task
//! streams broadcast frames plus direct replies back to the client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};

use crate::config::ServerConfig;
use crate::game::constants::entity::MAX_NAME_LEN;
use crate::game::constants::net::DIRECT_BUFFER_SIZE;
use crate::game::state::EntityId;
use crate::net::framing::{recv, send, write_message, FramingError};
use crate::net::game_session::{Frame, SessionError, SessionHandle};
use crate::net::protocol::{ClientMessage, ServerMessage};

/// Arena TCP server
pub struct TcpServer {
    config: ServerConfig,
    listener: TcpListener,
    session: SessionHandle,
    active: Arc<AtomicUsize>,
}

impl TcpServer {
    pub async fn bind(config: ServerConfig, session: SessionHandle) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.socket_addr()).await?;
        Ok(Self {
            config,
            listener,
            session,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    continue;
                }
            };

            if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
                tracing::warn!("Connection from {} refused: {} connections open", addr, self.config.max_connections);
                drop(stream);
                continue;
            }

            let guard = ConnectionGuard::new(self.active.clone());
            let session = self.session.clone();
            tokio::spawn(async move {
                let _guard = guard;
                if let Err(e) = handle_connection(stream, addr, session).await {
                    tracing::warn!("Connection {} error: {}", addr, e);
                }
            });
        }
    }
}

/// Counts a live connection for as long as it exists
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Sanitize a display name: trim, drop control and markup characters,
/// limit length, collapse internal whitespace
pub fn sanitize_name(raw: &str) -> String {
    let filtered: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| *c != '<' && *c != '>' && *c != '&')
        .take(MAX_NAME_LEN)
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, session: SessionHandle) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();
    tracing::debug!("Connection from {}", addr);

    let Some((entity_id, frames)) = await_join(&mut reader, &mut writer, &session).await? else {
        tracing::debug!("{} left before joining", addr);
        return Ok(());
    };

    let (direct_tx, direct_rx) = mpsc::channel(DIRECT_BUFFER_SIZE);
    let writer_task = tokio::spawn(write_loop(writer, frames, direct_rx));

    let result = read_loop(&mut reader, entity_id, &session, &direct_tx).await;

    // Exactly one disconnect, whatever ended the read loop
    session.disconnect(entity_id).await;
    writer_task.abort();

    match result {
        Ok(()) | Err(FramingError::ConnectionClosed) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Serve pings and join attempts until one succeeds
///
/// The broadcast subscription is taken before the join command is sent, so
/// the returned receiver already holds the join's own events. Returns `None`
/// if the client leaves or hangs up first.
async fn await_join(
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    session: &SessionHandle,
) -> anyhow::Result<Option<(EntityId, broadcast::Receiver<Frame>)>> {
    loop {
        let message: ClientMessage = match recv(reader).await {
            Ok(message) => message,
            Err(FramingError::ConnectionClosed) => return Ok(None),
            Err(FramingError::Decode(e)) => {
                tracing::warn!("Undecodable message before join: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match message {
            ClientMessage::Join { name } => {
                let name = sanitize_name(&name);
                let frames = session.subscribe();
                match session.join(name).await {
                    Ok(joined) => {
                        let reply = ServerMessage::JoinAccepted {
                            entity_id: joined.entity_id,
                            world: joined.world,
                            weapons: joined.weapons,
                        };
                        if let Err(e) = send(writer, &reply).await {
                            session.disconnect(joined.entity_id).await;
                            return Err(e.into());
                        }
                        return Ok(Some((joined.entity_id, frames)));
                    }
                    Err(SessionError::Join(e)) => {
                        send(writer, &ServerMessage::JoinRejected { reason: e.to_string() }).await?;
                    }
                    Err(SessionError::Closed) => return Ok(None),
                }
            }
            ClientMessage::Ping { timestamp } => {
                let pong = ServerMessage::Pong {
                    client_timestamp: timestamp,
                    server_timestamp: session.now(),
                };
                send(writer, &pong).await?;
            }
            ClientMessage::Leave => return Ok(None),
            ClientMessage::Input(_) => {}
        }
    }
}

async fn read_loop(
    reader: &mut OwnedReadHalf,
    entity_id: EntityId,
    session: &SessionHandle,
    direct: &mpsc::Sender<ServerMessage>,
) -> Result<(), FramingError> {
    loop {
        let message: ClientMessage = match recv(reader).await {
            Ok(message) => message,
            Err(FramingError::Decode(e)) => {
                tracing::warn!("Undecodable message from {}: {}", entity_id, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        match message {
            ClientMessage::Input(input) => {
                if !session.submit_input(entity_id, input) {
                    tracing::warn!("Input buffer full, dropped input from {}", entity_id);
                }
            }
            ClientMessage::Ping { timestamp } => {
                let pong = ServerMessage::Pong {
                    client_timestamp: timestamp,
                    server_timestamp: session.now(),
                };
                if direct.try_send(pong).is_err() {
                    tracing::debug!("Pong to {} dropped", entity_id);
                }
            }
            ClientMessage::Leave => return Ok(()),
            ClientMessage::Join { .. } => {
                tracing::warn!("{} sent Join while already in game", entity_id);
            }
        }
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut frames: broadcast::Receiver<Frame>,
    mut direct: mpsc::Receiver<ServerMessage>,
) {
    loop {
        let result = tokio::select! {
            message = direct.recv() => match message {
                Some(message) => send(&mut writer, &message).await,
                None => break,
            },
            frame = frames.recv() => match frame {
                Ok(frame) => write_message(&mut writer, &frame).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Slow client skipped {} frames", skipped);
                    Ok(())
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if let Err(e) = result {
            tracing::debug!("Write failed: {}", e);
            break;
        }
    }
}
