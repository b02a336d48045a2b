// Cumulative win counts for the two seats of a session.

use super::weapon::{Player, RoundResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSnapshot {
    pub local: u32,
    pub other: u32,
}

/// Both counters live in one struct so neither entry can exist alone.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    local: u32,
    other: u32,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the winner of a round; draws leave the ledger untouched.
    pub fn record_result(&mut self, result: RoundResult) {
        match result.winner() {
            Some(Player::Local) => self.local = self.local.saturating_add(1),
            Some(Player::Other) => self.other = self.other.saturating_add(1),
            None => {}
        }
    }

    pub fn reset(&mut self) {
        self.local = 0;
        self.other = 0;
    }

    pub fn wins(&self, player: Player) -> u32 {
        match player {
            Player::Local => self.local,
            Player::Other => self.other,
        }
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            local: self.local,
            other: self.other,
        }
    }
}
