// Round lifecycle: start handshake, countdown, sealed reveal and resolution.

use super::errors::IntentRejected;
use super::weapon::{Player, RoundResult, Weapon, resolve};

/// Countdown length used when the caller does not configure one.
pub const DEFAULT_COUNTDOWN: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    AwaitingStart,
    PendingStartSent,
    PendingStartReceived,
    Countdown,
    AwaitingReveal,
    Finished,
    SessionEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingStart,
    PendingStartSent,
    PendingStartReceived,
    Countdown(u32),
    // Local countdown expired; the peer's reveal has not arrived yet.
    AwaitingReveal,
    Finished(RoundResult),
    SessionEnded,
}

impl Phase {
    pub fn status(self) -> GameStatus {
        match self {
            Phase::AwaitingStart => GameStatus::AwaitingStart,
            Phase::PendingStartSent => GameStatus::PendingStartSent,
            Phase::PendingStartReceived => GameStatus::PendingStartReceived,
            Phase::Countdown(_) => GameStatus::Countdown,
            Phase::AwaitingReveal => GameStatus::AwaitingReveal,
            Phase::Finished(_) => GameStatus::Finished,
            Phase::SessionEnded => GameStatus::SessionEnded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Pending,
    Committed(Weapon),
    // No weapon by expiry; counts as a loss for that player.
    Forfeited,
}

impl Choice {
    pub fn weapon(self) -> Option<Weapon> {
        match self {
            Choice::Committed(weapon) => Some(weapon),
            Choice::Pending | Choice::Forfeited => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        !matches!(self, Choice::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub player: Player,
    pub choice: Choice,
}

impl Play {
    fn pending(player: Player) -> Self {
        Self {
            player,
            choice: Choice::Pending,
        }
    }
}

/// Messages the round needs delivered to the peer's round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerCommand {
    RequestStart,
    AnswerStart { accept: bool },
    /// Sent once, when the local countdown expires. `None` means no weapon was chosen.
    Reveal(Option<Weapon>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    RequestStart,
    StartRequestReceived,
    RespondStart { accept: bool },
    StartResponseReceived { accept: bool },
    ChooseWeapon(Weapon),
    RevealReceived(Option<Weapon>),
    Tick,
    PeerDisconnected,
}

/// What an applied event did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved,
    Committed(Weapon),
    // The peer's sealed weapon arrived before the local countdown ended.
    PeerRevealed,
    Resolved(RoundResult),
    SessionEnded,
    Ignored(IntentRejected),
}

/// Result of one `apply`: the transition plus any message owed to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub transition: Transition,
    pub command: Option<PeerCommand>,
}

impl Outcome {
    fn sending(mut self, command: PeerCommand) -> Self {
        self.command = Some(command);
        self
    }

    pub fn is_applied(&self) -> bool {
        !matches!(self.transition, Transition::Ignored(_))
    }
}

impl From<Transition> for Outcome {
    fn from(transition: Transition) -> Self {
        Self {
            transition,
            command: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerReveal {
    Awaited,
    Received(Option<Weapon>),
}

/// Applies the forfeit policy: a missing weapon loses, two missing weapons draw.
pub fn resolve_plays(local: Choice, other: Choice) -> (RoundResult, Choice, Choice) {
    let settle = |choice: Choice| match choice {
        Choice::Pending => Choice::Forfeited,
        resolved => resolved,
    };
    let result = match (local.weapon(), other.weapon()) {
        (Some(local), Some(other)) => resolve(local, other),
        (Some(_), None) => RoundResult::LocalWin,
        (None, Some(_)) => RoundResult::OtherWin,
        (None, None) => RoundResult::Draw,
    };
    (result, settle(local), settle(other))
}

/// One side's view of the round.
///
/// The local weapon stays private until the local countdown expires, and the
/// round resolves only once that reveal has gone out and the peer's reveal has
/// come in. Both sides therefore resolve the same pair of weapons no matter
/// which of them expires first.
#[derive(Debug, Clone)]
pub struct RoundState {
    phase: Phase,
    local: Play,
    // Stays pending until resolution; the peer's weapon is held in `peer_reveal`.
    other: Play,
    peer_reveal: PeerReveal,
    countdown_start: u32,
}

impl RoundState {
    pub fn new(countdown_start: u32) -> Self {
        Self {
            phase: Phase::AwaitingStart,
            local: Play::pending(Player::Local),
            other: Play::pending(Player::Other),
            peer_reveal: PeerReveal::Awaited,
            countdown_start: countdown_start.max(1),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> GameStatus {
        self.phase.status()
    }

    pub fn countdown(&self) -> Option<u32> {
        match self.phase {
            Phase::Countdown(n) => Some(n),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<RoundResult> {
        match self.phase {
            Phase::Finished(result) => Some(result),
            _ => None,
        }
    }

    pub fn countdown_start(&self) -> u32 {
        self.countdown_start
    }

    pub fn play(&self, player: Player) -> Play {
        match player {
            Player::Local => self.local,
            Player::Other => self.other,
        }
    }

    /// Total over every (phase, event) pair; ignored events leave the state untouched.
    pub fn apply(&mut self, event: RoundEvent) -> Outcome {
        if self.phase == Phase::SessionEnded {
            return Transition::Ignored(IntentRejected::SessionClosed).into();
        }

        match (self.phase, event) {
            (_, RoundEvent::PeerDisconnected) => {
                self.clear_plays();
                self.phase = Phase::SessionEnded;
                Transition::SessionEnded.into()
            }

            (Phase::AwaitingStart | Phase::Finished(_), RoundEvent::RequestStart) => self
                .enter(Phase::PendingStartSent)
                .sending(PeerCommand::RequestStart),
            (Phase::AwaitingStart | Phase::Finished(_), RoundEvent::StartRequestReceived) => {
                self.enter(Phase::PendingStartReceived)
            }

            // Both sides asked at once. Accepting out loud releases a peer that
            // never saw our request as a crossing one.
            (Phase::PendingStartSent, RoundEvent::StartRequestReceived) => self
                .begin_countdown()
                .sending(PeerCommand::AnswerStart { accept: true }),
            // The peer finished first and wants another round; turn it down so it
            // goes back to waiting instead of hanging on an answer.
            (Phase::Countdown(_) | Phase::AwaitingReveal, RoundEvent::StartRequestReceived) => {
                Outcome::from(Transition::Ignored(IntentRejected::RoundInProgress))
                    .sending(PeerCommand::AnswerStart { accept: false })
            }

            (Phase::PendingStartReceived, RoundEvent::RespondStart { accept }) => {
                let outcome = if accept {
                    self.begin_countdown()
                } else {
                    self.enter(Phase::AwaitingStart)
                };
                outcome.sending(PeerCommand::AnswerStart { accept })
            }
            (Phase::PendingStartSent, RoundEvent::StartResponseReceived { accept }) => {
                if accept {
                    self.begin_countdown()
                } else {
                    self.enter(Phase::AwaitingStart)
                }
            }

            (Phase::Countdown(_), RoundEvent::ChooseWeapon(weapon)) => {
                if self.local.choice.is_resolved() {
                    return Transition::Ignored(IntentRejected::AlreadyCommitted).into();
                }
                self.local.choice = Choice::Committed(weapon);
                Transition::Committed(weapon).into()
            }
            (_, RoundEvent::ChooseWeapon(_)) => {
                Transition::Ignored(IntentRejected::OutsideCountdown).into()
            }

            (Phase::Countdown(_) | Phase::AwaitingReveal, RoundEvent::RevealReceived(weapon))
                if self.peer_reveal == PeerReveal::Awaited =>
            {
                self.peer_reveal = PeerReveal::Received(weapon);
                if self.phase == Phase::AwaitingReveal {
                    self.resolve().into()
                } else {
                    Transition::PeerRevealed.into()
                }
            }
            (_, RoundEvent::RevealReceived(_)) => {
                Transition::Ignored(IntentRejected::UnexpectedReveal).into()
            }

            (Phase::Countdown(n), RoundEvent::Tick) if n > 1 => {
                self.phase = Phase::Countdown(n - 1);
                Transition::Moved.into()
            }
            (Phase::Countdown(_), RoundEvent::Tick) => {
                // Local time is up: the local weapon is final and goes out now.
                let reveal = PeerCommand::Reveal(self.local.choice.weapon());
                let transition = match self.peer_reveal {
                    PeerReveal::Received(_) => self.resolve(),
                    PeerReveal::Awaited => {
                        self.phase = Phase::AwaitingReveal;
                        Transition::Moved
                    }
                };
                Outcome::from(transition).sending(reveal)
            }
            (_, RoundEvent::Tick) => Transition::Ignored(IntentRejected::NoCountdown).into(),

            (phase, _) => Transition::Ignored(IntentRejected::NotAllowed {
                status: phase.status(),
            })
            .into(),
        }
    }

    fn resolve(&mut self) -> Transition {
        let other = match self.peer_reveal {
            PeerReveal::Received(Some(weapon)) => Choice::Committed(weapon),
            PeerReveal::Received(None) | PeerReveal::Awaited => Choice::Pending,
        };
        let (result, local, other) = resolve_plays(self.local.choice, other);
        self.local.choice = local;
        self.other.choice = other;
        self.phase = Phase::Finished(result);
        Transition::Resolved(result)
    }

    fn enter(&mut self, phase: Phase) -> Outcome {
        self.clear_plays();
        self.phase = phase;
        Transition::Moved.into()
    }

    fn begin_countdown(&mut self) -> Outcome {
        self.enter(Phase::Countdown(self.countdown_start))
    }

    fn clear_plays(&mut self) {
        self.local = Play::pending(Player::Local);
        self.other = Play::pending(Player::Other);
        self.peer_reveal = PeerReveal::Awaited;
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN)
    }
}
