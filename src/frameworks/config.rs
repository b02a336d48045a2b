use std::{env, net::IpAddr, time::Duration};

use crate::domain::DEFAULT_COUNTDOWN;

// Runtime settings read from the environment, with defaults.

pub fn http_port() -> u16 {
    env::var("RPS_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn bind_addr() -> IpAddr {
    env::var("RPS_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn display_name() -> String {
    env::var("RPS_DISPLAY_NAME")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "player".to_string())
}

/// Peer to dial on startup; when unset this process waits to be dialed.
pub fn peer_url() -> Option<String> {
    env::var("RPS_PEER_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn countdown_start() -> u32 {
    env::var("RPS_COUNTDOWN_START")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_COUNTDOWN)
}

pub fn tick_interval() -> Duration {
    let millis = env::var("RPS_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(1000);
    Duration::from_millis(millis)
}

pub fn handshake_timeout() -> Duration {
    let millis = env::var("RPS_HANDSHAKE_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(3000);
    Duration::from_millis(millis)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// `LOG_FORMAT=json` switches to structured lines; anything else stays human readable.
pub fn log_format() -> LogFormat {
    match env::var("LOG_FORMAT") {
        Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Compact,
    }
}

pub fn console_enabled() -> bool {
    env::var("RPS_CONSOLE")
        .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"))
        .unwrap_or(true)
}

pub const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const PEER_CHANNEL_CAPACITY: usize = 64;
