use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{HelloPayload, PeerMessage};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{PeerCommand, PeerEvent, SessionError, SessionEvent, SessionHandle, SessionRegistry};

use async_trait::async_trait;
use axum::{
    Json,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite};
use tracing::{Instrument, debug, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_FRAMES: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;

#[derive(Debug)]
pub enum LinkError {
    // Categorizes peer link failures so callers can decide policy.
    Ws(String),
    Serialization(serde_json::Error),
    HandshakeTimeout,
    HandshakeRequired,
    ClosedBeforeHello,
    SessionBusy,
    SessionClosed,
    TooManyInvalidFrames,
}

/// Peer link policy shared by accepted and dialed connections.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// How long each side waits for the other's `Hello`.
    pub handshake_timeout: Duration,
}

/// Text-frame view of a WebSocket, so both socket flavours share one link loop.
#[async_trait]
pub trait PeerTransport: Send {
    /// Next text frame, or `None` once the peer closed the socket.
    async fn recv_text(&mut self) -> Result<Option<String>, LinkError>;
    async fn send_text(&mut self, text: String) -> Result<(), LinkError>;
    /// Closes the socket, telling the peer why when a reason is given.
    async fn close(&mut self, reason: Option<&'static str>);
}

/// Server side of the link, upgraded from `GET /peer`.
pub struct AcceptedPeer(WebSocket);

#[async_trait]
impl PeerTransport for AcceptedPeer {
    async fn recv_text(&mut self) -> Result<Option<String>, LinkError> {
        loop {
            match self.0.recv().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(e)) => return Err(LinkError::Ws(e.to_string())),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), LinkError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| LinkError::Ws(e.to_string()))
    }

    async fn close(&mut self, reason: Option<&'static str>) {
        if let Some(reason) = reason {
            let _ = self
                .0
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: reason.into(),
                })))
                .await;
        }
        if let Err(err) = SinkExt::close(&mut self.0).await {
            debug!(error = %err, "socket close error");
        }
    }
}

/// Client side of the link, dialed with tokio-tungstenite.
pub struct DialedPeer(WebSocketStream<MaybeTlsStream<TcpStream>>);

#[async_trait]
impl PeerTransport for DialedPeer {
    async fn recv_text(&mut self) -> Result<Option<String>, LinkError> {
        loop {
            match self.0.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(tungstenite::Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(LinkError::Ws(e.to_string())),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), LinkError> {
        self.0
            .send(tungstenite::Message::text(text))
            .await
            .map_err(|e| LinkError::Ws(e.to_string()))
    }

    async fn close(&mut self, reason: Option<&'static str>) {
        if let Some(reason) = reason {
            debug!(reason, "closing dialed peer");
        }
        if let Err(err) = self.0.close(None).await {
            debug!(error = %err, "socket close error");
        }
    }
}

pub async fn peer_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Refuse early when a peer is already playing; the link loop re-checks on open.
    if state.registry.active().await.is_some() {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("session busy")),
        )
            .into_response();
    }

    let registry = state.registry.clone();
    let link = state.link.clone();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_link(AcceptedPeer(socket), registry, &link).await {
            warn!(error = ?e, "peer link exited with error");
        }
    })
}

/// Connects to a peer that hosts the game and runs the link until it ends.
pub async fn dial_peer(
    url: &str,
    registry: Arc<SessionRegistry>,
    link: &LinkSettings,
) -> Result<(), LinkError> {
    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| LinkError::Ws(e.to_string()))?;
    info!(%url, "dialed peer");
    run_link(DialedPeer(stream), registry, link).await
}

fn next_conn_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_display_name(name: &str) -> String {
    let trimmed: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "opponent".to_string()
    } else {
        trimmed
    }
}

async fn send_frame<T: PeerTransport>(
    transport: &mut T,
    message: &PeerMessage,
) -> Result<(), LinkError> {
    let text = serde_json::to_string(message).map_err(LinkError::Serialization)?;
    transport.send_text(text).await
}

async fn exchange_hello<T: PeerTransport>(
    transport: &mut T,
    local_name: &str,
    timeout: Duration,
) -> Result<String, LinkError> {
    send_frame(
        transport,
        &PeerMessage::Hello(HelloPayload {
            display_name: local_name.to_string(),
        }),
    )
    .await?;

    let first = tokio::time::timeout(timeout, transport.recv_text())
        .await
        .map_err(|_| LinkError::HandshakeTimeout)??;
    let Some(text) = first else {
        return Err(LinkError::ClosedBeforeHello);
    };

    match serde_json::from_str::<PeerMessage>(&text) {
        Ok(PeerMessage::Hello(payload)) => Ok(sanitize_display_name(&payload.display_name)),
        Ok(_) => Err(LinkError::HandshakeRequired),
        Err(e) => Err(LinkError::Serialization(e)),
    }
}

#[derive(Debug, Default)]
struct LinkStats {
    frames_in: u64,
    frames_out: u64,
    invalid_frames: u32,
}

/// Handshakes, opens a session, and relays frames until either side goes away.
pub async fn run_link<T: PeerTransport>(
    mut transport: T,
    registry: Arc<SessionRegistry>,
    link: &LinkSettings,
) -> Result<(), LinkError> {
    let conn_id = next_conn_id();
    let span = info_span!("peer", conn_id, session_id = tracing::field::Empty);

    async move {
        let local_name = registry.settings().local_name.clone();
        let peer_name =
            match exchange_hello(&mut transport, &local_name, link.handshake_timeout).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(error = ?e, "peer handshake failed");
                    transport.close(Some("handshake failed")).await;
                    return Err(e);
                }
            };

        let (session, mut commands) = match registry.open_session(&peer_name).await {
            Ok(opened) => opened,
            Err(SessionError::AlreadyActive) => {
                warn!(peer = %peer_name, "peer refused; session already active");
                transport.close(Some("session busy")).await;
                return Err(LinkError::SessionBusy);
            }
        };
        tracing::Span::current().record("session_id", session.session_id.as_ref());
        info!(peer = %peer_name, "peer connected");

        let mut stats = LinkStats::default();
        let outcome = relay(&mut transport, &session, &mut commands, &mut stats).await;

        // Whatever ended the relay, the session must learn the peer is gone.
        let _ = session
            .event_tx
            .send(SessionEvent::Peer(PeerEvent::Disconnected))
            .await;
        let reason = match outcome {
            Err(LinkError::TooManyInvalidFrames) => Some("too many invalid frames"),
            _ => None,
        };
        transport.close(reason).await;

        debug!(
            frames_in = stats.frames_in,
            frames_out = stats.frames_out,
            invalid_frames = stats.invalid_frames,
            "link stats"
        );
        info!(peer = %peer_name, "peer disconnected");
        outcome
    }
    .instrument(span)
    .await
}

async fn relay<T: PeerTransport>(
    transport: &mut T,
    session: &SessionHandle,
    commands: &mut mpsc::Receiver<PeerCommand>,
    stats: &mut LinkStats,
) -> Result<(), LinkError> {
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;

    loop {
        tokio::select! {
            // Incoming frame from the peer.
            incoming = transport.recv_text() => {
                let Some(text) = incoming? else {
                    return Ok(());
                };
                stats.frames_in += 1;

                match serde_json::from_str::<PeerMessage>(&text) {
                    Ok(message) => match message.into_event() {
                        Some(event) => {
                            session
                                .event_tx
                                .send(SessionEvent::Peer(event))
                                .await
                                .map_err(|_| LinkError::SessionClosed)?;
                        }
                        None => {
                            if should_log(&mut last_invalid_log) {
                                warn!("duplicate hello ignored");
                            }
                        }
                    },
                    Err(parse_err) => {
                        stats.invalid_frames += 1;
                        if should_log(&mut last_invalid_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse peer frame"
                            );
                        }
                        if stats.invalid_frames > MAX_INVALID_FRAMES {
                            return Err(LinkError::TooManyInvalidFrames);
                        }
                    }
                }
            }

            // Outgoing command from the session.
            command = commands.recv() => {
                // The session dropped its sender, so it has ended.
                let Some(command) = command else {
                    return Ok(());
                };
                send_frame(transport, &PeerMessage::from(command)).await?;
                stats.frames_out += 1;
            }
        }
    }
}
