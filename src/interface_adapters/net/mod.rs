// Network adapter modules split by the peer socket vs the local player's HTTP routes.

pub mod local;
pub mod peer;

pub use local::{health_handler, intent_handler, leave_handler, snapshot_handler};
pub use peer::{LinkSettings, dial_peer, peer_ws_handler};
