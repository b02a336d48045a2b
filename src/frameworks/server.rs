// Framework bootstrap for the peer game runtime.

use crate::frameworks::config::{self, LogFormat};
use crate::interface_adapters::console::{run_console_input, run_console_output};
use crate::interface_adapters::net::{
    LinkSettings, dial_peer, health_handler, intent_handler, leave_handler, peer_ws_handler,
    snapshot_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{SessionRegistry, SessionSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

/// Everything the runtime needs, resolved up front so tests can build it directly.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub local_name: String,
    pub peer_url: Option<String>,
    pub countdown_start: u32,
    pub tick_interval: Duration,
    pub handshake_timeout: Duration,
    pub console: bool,
}

impl AppSettings {
    pub fn from_env() -> Self {
        Self {
            local_name: config::display_name(),
            peer_url: config::peer_url(),
            countdown_start: config::countdown_start(),
            tick_interval: config::tick_interval(),
            handshake_timeout: config::handshake_timeout(),
            console: config::console_enabled(),
        }
    }
}

// Installs the global subscriber; a second install (as in tests) is reported and skipped.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("tracing subscriber not installed: {e}");
    }
}

// Routes panics from any task into the log stream with where they happened.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic| {
        let payload = panic.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        let location = panic
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let thread = std::thread::current();

        tracing::error!(
            thread = thread.name().unwrap_or("unnamed"),
            %location,
            payload = message,
            "task panicked"
        );
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/peer", get(peer_ws_handler))
        .route("/intents", post(intent_handler))
        .route("/leave", post(leave_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener, settings: AppSettings) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&settings);
    let app = router(state.clone());

    tracing::info!(%address, local_name = %settings.local_name, "listening");

    if let Some(url) = settings.peer_url.clone() {
        let registry = state.registry.clone();
        let link = state.link.clone();
        tokio::spawn(async move {
            if let Err(e) = dial_peer(&url, registry, &link).await {
                tracing::error!(%url, error = ?e, "peer dial failed");
            }
        });
    }

    if settings.console {
        tokio::spawn(run_console_input(state.registry.clone()));
        tokio::spawn(run_console_output(state.registry.clone()));
    }

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    init_tracing(config::log_format());
    install_panic_hook();

    let settings = AppSettings::from_env();
    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, settings).await
}

fn build_state(settings: &AppSettings) -> Arc<AppState> {
    tracing::debug!(
        countdown_start = settings.countdown_start,
        tick_interval_ms = settings.tick_interval.as_millis(),
        handshake_timeout_ms = settings.handshake_timeout.as_millis(),
        "session settings"
    );

    // The registry owns the single session slot and its presentation channel.
    let registry = Arc::new(SessionRegistry::new(SessionSettings {
        local_name: Arc::from(settings.local_name.as_str()),
        countdown_start: settings.countdown_start,
        tick_interval: settings.tick_interval,
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        peer_channel_capacity: config::PEER_CHANNEL_CAPACITY,
    }));

    Arc::new(AppState {
        registry,
        link: LinkSettings {
            handshake_timeout: settings.handshake_timeout,
        },
    })
}
