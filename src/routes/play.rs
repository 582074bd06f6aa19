use axum::{
    Json, Router,
    extract::{Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::{
    dto::session::SessionSummary,
    error::AppError,
    services::{session_service, websocket_service},
    state::SharedState,
};

/// Player-facing routes: joining a session and reading its summary.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/join/{active_game_id}", get(player_ws_handler))
        .route("/sessions/{active_game_id}", get(get_session))
}

#[utoipa::path(
    get,
    path = "/join/{active_game_id}",
    tag = "players",
    params(("active_game_id" = String, Path, description = "Code of the session to join")),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 404, description = "Unknown session")
    )
)]
/// Upgrade to a player WebSocket; the player is registered once the upgrade succeeds.
pub async fn player_ws_handler(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let session = session_service::find_session(&state, &active_game_id)?;
    let code = active_game_id.clone();

    Ok(ws
        .on_failed_upgrade(move |err| {
            warn!(session = %code, error = %err, "player websocket upgrade failed");
        })
        .on_upgrade(move |socket| websocket_service::handle_player_socket(session, socket))
        .into_response())
}

#[utoipa::path(
    get,
    path = "/sessions/{active_game_id}",
    tag = "players",
    params(("active_game_id" = String, Path, description = "Code of the session")),
    responses(
        (status = 200, description = "Session summary", body = SessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
/// Return the public summary of a live session.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::session_summary(&state, &active_game_id).await?;
    Ok(Json(summary))
}
