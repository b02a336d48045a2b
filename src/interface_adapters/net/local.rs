use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ClientMessage, SnapshotDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Intent, SessionEvent};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub async fn intent_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClientMessage>,
) -> impl IntoResponse {
    let Some(session) = state.registry.active().await else {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("no active session")),
        )
            .into_response();
    };

    let intent = Intent::from(payload);
    debug!(session_id = %session.session_id, ?intent, "local intent");
    match session.event_tx.send(SessionEvent::Local(intent)).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => {
            // The session ended between lookup and send.
            warn!(session_id = %session.session_id, "session closed before intent delivery");
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("no active session")),
            )
                .into_response()
        }
    }
}

/// Ends the active session on behalf of the local player.
pub async fn leave_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.registry.end_active().await {
        StatusCode::ACCEPTED.into_response()
    } else {
        (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("no active session")),
        )
            .into_response()
    }
}

pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dto = match state.registry.latest_snapshot() {
        Some(snapshot) => SnapshotDto::from(&snapshot),
        None => SnapshotDto::idle(&state.registry.settings().local_name),
    };
    Json(dto)
}

pub async fn health_handler() -> &'static str {
    "ok"
}
