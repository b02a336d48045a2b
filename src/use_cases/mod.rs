// Use cases layer: session workflows around the round core.

pub mod countdown;
pub mod registry;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use countdown::{CountdownScheduler, TokioCountdown};
pub use registry::{SessionError, SessionHandle, SessionRegistry, SessionSettings};
pub use session::{GameSession, SessionChannels, SessionIdentity, Step, session_task};
pub use types::{GameSnapshot, Intent, PeerCommand, PeerEvent, SessionEvent, TimerEvent};
