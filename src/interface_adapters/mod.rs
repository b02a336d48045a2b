// Interface adapters: wire protocol, peer link, local client surfaces.

pub mod console;
pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
