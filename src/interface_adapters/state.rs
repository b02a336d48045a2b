use crate::interface_adapters::net::peer::LinkSettings;
use crate::use_cases::SessionRegistry;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    // Owner of the single peer session and its presentation channel.
    pub registry: Arc<SessionRegistry>,
    // Peer link policy shared by accepted and dialed connections.
    pub link: LinkSettings,
}
