// Session controller: owns the round, the ledger and the countdown timer.

use super::countdown::CountdownScheduler;
use super::types::{GameSnapshot, Intent, PeerCommand, PeerEvent, SessionEvent, TimerEvent};
use crate::domain::{
    GameStatus, Outcome, Player, RoundEvent, RoundState, ScoreLedger, Transition,
};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, info, warn};

/// Names attached to a session for logging and presentation.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    /// Identifier shared by logs, snapshots and the registry slot.
    pub session_id: Arc<str>,
    /// Display name of the player who owns this process.
    pub local_name: Arc<str>,
    /// Display name the peer announced in its hello.
    pub peer_name: Arc<str>,
}

/// Outcome of feeding one event into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    /// Message the peer link should deliver, if the round owes the peer one.
    pub outbound: Option<PeerCommand>,
    /// True when the published snapshot would differ.
    pub changed: bool,
    /// True once the session reached its terminal state.
    pub ended: bool,
}

/// Single writer over the round state; every event goes through `handle` or `on_timer`.
pub struct GameSession<S: CountdownScheduler> {
    /// Names used in logs and snapshots.
    identity: SessionIdentity,
    /// Round state machine for the current round.
    round: RoundState,
    /// Wins per player for the lifetime of the session.
    ledger: ScoreLedger,
    /// Timer driving the countdown while the round is in `Countdown`.
    scheduler: S,
    /// Where scheduler callbacks land; drained by the session loop.
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    /// Run currently allowed to deliver ticks.
    active_run: Option<u64>,
    /// Monotonic run counter so each countdown gets a fresh tag.
    runs_started: u64,
    /// Rounds that reached a result.
    rounds_played: u32,
    /// Events the round refused, kept for diagnostics.
    ignored_events: u64,
}

impl<S: CountdownScheduler> GameSession<S> {
    pub fn new(
        identity: SessionIdentity,
        countdown_start: u32,
        scheduler: S,
        timer_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        // The ledger is created fresh here, which is the only reset a session gets.
        Self {
            identity,
            round: RoundState::new(countdown_start),
            ledger: ScoreLedger::new(),
            scheduler,
            timer_tx,
            active_run: None,
            runs_started: 0,
            rounds_played: 0,
            ignored_events: 0,
        }
    }

    pub fn session_id(&self) -> &Arc<str> {
        &self.identity.session_id
    }

    pub fn status(&self) -> GameStatus {
        self.round.status()
    }

    /// Applies a local intent or a peer event.
    pub fn handle(&mut self, event: SessionEvent) -> Step {
        // Local and peer events share one round; only the direction differs.
        let round_event = match event {
            SessionEvent::Local(Intent::ChooseWeapon(weapon)) => RoundEvent::ChooseWeapon(weapon),
            SessionEvent::Local(Intent::RequestStart) => RoundEvent::RequestStart,
            SessionEvent::Local(Intent::RespondStart { accept }) => {
                RoundEvent::RespondStart { accept }
            }
            SessionEvent::Peer(PeerEvent::StartRequested) => RoundEvent::StartRequestReceived,
            SessionEvent::Peer(PeerEvent::StartAnswered { accept }) => {
                RoundEvent::StartResponseReceived { accept }
            }
            SessionEvent::Peer(PeerEvent::Revealed(weapon)) => RoundEvent::RevealReceived(weapon),
            SessionEvent::Peer(PeerEvent::Disconnected) => RoundEvent::PeerDisconnected,
        };

        let outcome = self.apply(round_event);
        self.step(outcome)
    }

    /// Applies a scheduler callback; callbacks from a stopped run are dropped.
    pub fn on_timer(&mut self, event: TimerEvent) -> Step {
        match event {
            TimerEvent::Tick { run, remaining } if self.active_run == Some(run) => {
                debug!(session_id = %self.identity.session_id, run, remaining, "countdown tick");
                let outcome = self.apply(RoundEvent::Tick);
                self.step(outcome)
            }
            TimerEvent::Expired { run } if self.active_run == Some(run) => {
                // The last tick already moved the round on; just release the timer.
                self.scheduler.stop();
                self.active_run = None;
                Step::default()
            }
            stale => {
                debug!(session_id = %self.identity.session_id, ?stale, "stale timer event dropped");
                Step::default()
            }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            session_id: self.identity.session_id.clone(),
            local_name: self.identity.local_name.clone(),
            peer_name: self.identity.peer_name.clone(),
            status: self.round.status(),
            countdown: self.round.countdown(),
            local: self.round.play(Player::Local),
            other: self.round.play(Player::Other),
            result: self.round.result(),
            score: self.ledger.snapshot(),
            rounds_played: self.rounds_played,
            ignored_events: self.ignored_events,
        }
    }

    /// Releases the countdown timer; safe to call more than once.
    pub fn close(&mut self) {
        self.scheduler.stop();
        self.active_run = None;
    }

    fn step(&self, outcome: Outcome) -> Step {
        Step {
            // Replies can be owed even when the round itself did not move.
            outbound: outcome.command,
            changed: outcome.is_applied(),
            ended: self.round.status() == GameStatus::SessionEnded,
        }
    }

    fn apply(&mut self, event: RoundEvent) -> Outcome {
        let session_id = &self.identity.session_id;
        let outcome = self.round.apply(event);

        match outcome.transition {
            Transition::Ignored(reason) => {
                self.ignored_events += 1;
                debug!(%session_id, ?event, %reason, reply = ?outcome.command, "event ignored");
            }
            Transition::Moved => {
                debug!(
                    %session_id,
                    status = ?self.round.status(),
                    countdown = ?self.round.countdown(),
                    "round moved"
                );
            }
            Transition::Committed(weapon) => {
                debug!(%session_id, ?weapon, "local weapon committed");
            }
            Transition::PeerRevealed => {
                // Weapon stays out of the logs until the round resolves.
                debug!(%session_id, "peer weapon received before local expiry");
            }
            Transition::Resolved(result) => {
                self.ledger.record_result(result);
                self.rounds_played += 1;
                let score = self.ledger.snapshot();
                info!(
                    %session_id,
                    ?result,
                    local = ?self.round.play(Player::Local).choice,
                    other = ?self.round.play(Player::Other).choice,
                    local_wins = score.local,
                    other_wins = score.other,
                    "round resolved"
                );
            }
            Transition::SessionEnded => {
                info!(%session_id, peer = %self.identity.peer_name, "peer disconnected; session ended");
            }
        }

        self.sync_scheduler();
        outcome
    }

    // Keeps the timer alive exactly while the round is counting down.
    fn sync_scheduler(&mut self) {
        let counting = self.round.status() == GameStatus::Countdown;
        match (counting, self.active_run) {
            (true, None) => self.start_countdown(),
            (false, Some(run)) => {
                debug!(session_id = %self.identity.session_id, run, "countdown stopped");
                self.scheduler.stop();
                self.active_run = None;
            }
            _ => {}
        }
    }

    fn start_countdown(&mut self) {
        // Tag every callback with the run so late ones can be recognised.
        self.runs_started += 1;
        let run = self.runs_started;
        let tick_tx = self.timer_tx.clone();
        let expire_tx = self.timer_tx.clone();

        self.scheduler.start(
            self.round.countdown_start(),
            Box::new(move |remaining| {
                let _ = tick_tx.send(TimerEvent::Tick { run, remaining });
            }),
            Box::new(move || {
                let _ = expire_tx.send(TimerEvent::Expired { run });
            }),
        );
        self.active_run = Some(run);
        debug!(session_id = %self.identity.session_id, run, "countdown started");
    }
}

impl<S: CountdownScheduler> Drop for GameSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Channel ends owned by a running session task.
pub struct SessionChannels {
    /// Local intents and peer events.
    pub event_rx: mpsc::Receiver<SessionEvent>,
    /// Countdown callbacks from the scheduler.
    pub timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    /// Commands for the peer link to write out.
    pub peer_tx: mpsc::Sender<PeerCommand>,
    /// Latest snapshot for renderers.
    pub presentation_tx: watch::Sender<Option<GameSnapshot>>,
    /// Fired when the local player leaves.
    pub shutdown: Arc<Notify>,
}

/// Event loop for one session. Intents, peer events and ticks are applied one at a time.
pub async fn session_task<S: CountdownScheduler>(
    mut session: GameSession<S>,
    channels: SessionChannels,
) {
    let SessionChannels {
        mut event_rx,
        mut timer_rx,
        peer_tx,
        presentation_tx,
        shutdown,
    } = channels;
    // Every way out of the loop goes through the same terminal event.
    let lost = SessionEvent::Peer(PeerEvent::Disconnected);

    presentation_tx.send_replace(Some(session.snapshot()));
    info!(session_id = %session.session_id(), "session started");

    loop {
        let mut step = tokio::select! {
            _ = shutdown.notified() => {
                info!(session_id = %session.session_id(), "session shutdown requested");
                session.handle(lost)
            }
            event = event_rx.recv() => match event {
                Some(event) => session.handle(event),
                // No producer can reach this session anymore.
                None => session.handle(lost),
            },
            Some(timer) = timer_rx.recv() => session.on_timer(timer),
        };

        // Forward before publishing so the peer hears about a reveal no later than the UI.
        if let Some(command) = step.outbound {
            if peer_tx.send(command).await.is_err() {
                warn!(session_id = %session.session_id(), "peer link closed; ending session");
                step = session.handle(lost);
            }
        }

        if step.changed {
            presentation_tx.send_replace(Some(session.snapshot()));
        }

        if step.ended {
            break;
        }
    }

    session.close();
    info!(session_id = %session.session_id(), "session closed");
}
