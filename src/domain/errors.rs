// Domain-level reasons an event was ignored by the round state machine.

use std::fmt;

use super::round::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentRejected {
    // The session is over; nothing is applied anymore.
    SessionClosed,
    // Weapons are only accepted while the countdown runs.
    OutsideCountdown,
    // The player already locked in a weapon this round.
    AlreadyCommitted,
    // A tick arrived with no countdown in progress.
    NoCountdown,
    // A start request arrived while a round was still being played.
    RoundInProgress,
    // A reveal arrived outside a round or after the peer already revealed.
    UnexpectedReveal,
    // The intent has no transition from the current status.
    NotAllowed { status: GameStatus },
}

impl fmt::Display for IntentRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentRejected::SessionClosed => f.write_str("session closed"),
            IntentRejected::OutsideCountdown => f.write_str("weapon chosen outside countdown"),
            IntentRejected::AlreadyCommitted => f.write_str("weapon already committed"),
            IntentRejected::NoCountdown => f.write_str("tick without countdown"),
            IntentRejected::RoundInProgress => f.write_str("round still in progress"),
            IntentRejected::UnexpectedReveal => f.write_str("unexpected weapon reveal"),
            IntentRejected::NotAllowed { status } => {
                write!(f, "not allowed while {status:?}")
            }
        }
    }
}
