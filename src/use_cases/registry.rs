// Session registry: owns the single active peer session of this process.

use super::countdown::TokioCountdown;
use super::session::{GameSession, SessionChannels, SessionIdentity, session_task};
use super::types::{GameSnapshot, PeerCommand, SessionEvent};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock, mpsc, watch};
use tracing::info;
use uuid::Uuid;

/// Shared configuration for new sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Display name of the player who owns this process.
    pub local_name: Arc<str>,
    /// Countdown value a round starts from.
    pub countdown_start: u32,
    /// Interval between countdown ticks.
    pub tick_interval: Duration,
    /// Capacity for inbound intents and peer events.
    pub event_channel_capacity: usize,
    /// Capacity for commands waiting to go out over the peer link.
    pub peer_channel_capacity: usize,
}

/// Errors returned by registry operations.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Another peer already holds the session slot.
    AlreadyActive,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AlreadyActive => f.write_str("a session is already active"),
        }
    }
}

/// Entry points into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Identifier used in logs and snapshots.
    pub session_id: Arc<str>,
    /// Display name the peer announced during the handshake.
    pub peer_name: Arc<str>,
    /// Sender for intents and peer events into the session task.
    pub event_tx: mpsc::Sender<SessionEvent>,
    /// Wakes the session task's shutdown branch.
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    /// Asks the session task to end as if the peer had left.
    pub fn end(&self) {
        self.shutdown.notify_one();
    }
}

/// Owner of the single session slot and the app-wide presentation channel.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Settings applied to every new session.
    settings: SessionSettings,
    /// The session slot; `None` while waiting for a peer.
    active: RwLock<Option<SessionHandle>>,
    /// Latest snapshot of the current or most recent session.
    presentation_tx: watch::Sender<Option<GameSnapshot>>,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings) -> Self {
        let (presentation_tx, _presentation_rx) = watch::channel(None);
        Self {
            settings,
            active: RwLock::new(None),
            presentation_tx,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Opens a session with a freshly connected peer and spawns its task.
    ///
    /// Returns the handle plus the receiver the peer link drains for outbound commands.
    pub async fn open_session(
        self: &Arc<Self>,
        peer_name: &str,
    ) -> Result<(SessionHandle, mpsc::Receiver<PeerCommand>), SessionError> {
        // Hold the write lock until the handle is stored so two peers cannot both win the slot.
        let mut active = self.active.write().await;
        if active.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        // Every session gets a fresh id and, with it, a fresh score ledger.
        let session_id: Arc<str> = Arc::from(Uuid::new_v4().to_string());
        let peer_name: Arc<str> = Arc::from(peer_name);

        // Channel wiring for the session loop.
        let (event_tx, event_rx) = mpsc::channel(self.settings.event_channel_capacity);
        let (peer_tx, peer_rx) = mpsc::channel(self.settings.peer_channel_capacity);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());

        // Real timer in production; tests swap in a manual scheduler at the session level.
        let session = GameSession::new(
            SessionIdentity {
                session_id: session_id.clone(),
                local_name: self.settings.local_name.clone(),
                peer_name: peer_name.clone(),
            },
            self.settings.countdown_start,
            TokioCountdown::new(self.settings.tick_interval),
            timer_tx,
        );
        // Snapshots go to the registry-wide channel so renderers survive session turnover.
        let channels = SessionChannels {
            event_rx,
            timer_rx,
            peer_tx,
            presentation_tx: self.presentation_tx.clone(),
            shutdown: shutdown.clone(),
        };

        // Free the slot once the session loop exits, whatever the reason.
        let registry = Arc::clone(self);
        let released_id = session_id.clone();
        tokio::spawn(async move {
            session_task(session, channels).await;
            registry.release(&released_id).await;
        });

        let handle = SessionHandle {
            session_id,
            peer_name,
            event_tx,
            shutdown,
        };
        info!(session_id = %handle.session_id, peer = %handle.peer_name, "session opened");
        *active = Some(handle.clone());
        Ok((handle, peer_rx))
    }

    /// Returns the active session handle, if a peer is connected.
    pub async fn active(&self) -> Option<SessionHandle> {
        self.active.read().await.clone()
    }

    /// Subscribes to the presentation snapshots of every session this registry runs.
    pub fn presentation(&self) -> watch::Receiver<Option<GameSnapshot>> {
        self.presentation_tx.subscribe()
    }

    /// Latest snapshot published by the current or most recent session.
    pub fn latest_snapshot(&self) -> Option<GameSnapshot> {
        self.presentation_tx.borrow().clone()
    }

    /// Ends the active session as if the peer had left; returns false when idle.
    pub async fn end_active(&self) -> bool {
        match self.active().await {
            Some(handle) => {
                info!(session_id = %handle.session_id, "leaving session");
                handle.end();
                true
            }
            None => false,
        }
    }

    // Only clears the slot if it still belongs to the session that exited.
    async fn release(&self, session_id: &str) {
        let mut active = self.active.write().await;
        if active
            .as_ref()
            .is_some_and(|handle| handle.session_id.as_ref() == session_id)
        {
            *active = None;
            info!(session_id, "session slot released");
        }
    }
}
