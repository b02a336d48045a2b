// Use-case level inputs/outputs for the session loop.

use crate::domain::{GameStatus, Play, RoundResult, ScoreSnapshot, Weapon};
use std::sync::Arc;

// Outbound peer messages are decided by the round itself.
pub use crate::domain::PeerCommand;

/// Intents raised by the player who owns this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ChooseWeapon(Weapon),
    RequestStart,
    RespondStart { accept: bool },
}

/// Events arriving over the peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerEvent {
    StartRequested,
    StartAnswered { accept: bool },
    // The peer's countdown expired; `None` when it never chose.
    Revealed(Option<Weapon>),
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Local(Intent),
    Peer(PeerEvent),
}

/// Scheduler callbacks, tagged with the countdown run that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { run: u64, remaining: u32 },
    Expired { run: u64 },
}

/// Read-only view of a session published after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub session_id: Arc<str>,
    pub local_name: Arc<str>,
    pub peer_name: Arc<str>,
    pub status: GameStatus,
    pub countdown: Option<u32>,
    pub local: Play,
    pub other: Play,
    pub result: Option<RoundResult>,
    pub score: ScoreSnapshot,
    pub rounds_played: u32,
    pub ignored_events: u64,
}

impl GameSnapshot {
    pub fn is_active(&self) -> bool {
        self.status != GameStatus::SessionEnded
    }
}
