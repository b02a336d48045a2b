// Domain layer: round rules, resolution and scoring.

pub mod errors;
pub mod round;
pub mod score;
pub mod weapon;

pub use errors::IntentRejected;
pub use round::{
    Choice, DEFAULT_COUNTDOWN, GameStatus, Outcome, PeerCommand, Phase, Play, RoundEvent,
    RoundState, Transition,
};
pub use score::{ScoreLedger, ScoreSnapshot};
pub use weapon::{Player, RoundResult, Weapon, resolve};
