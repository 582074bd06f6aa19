use axum::{
    Json, Router,
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::warn;

use crate::{
    dto::admin::{AdminPage, GameSummary, QuestionAdvanced, StartSessionResponse},
    error::AppError,
    services::{session_service, websocket_service},
    state::SharedState,
};

/// Host routes: catalog listing, session creation, host page and game progression.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/games", get(list_games))
        .route("/admin/start/{game_id}", post(start_session))
        .route("/admin/join/{active_game_id}", get(admin_ws_handler))
        .route(
            "/admin/{active_game_id}",
            get(admin_page).delete(close_session),
        )
        .route("/admin/{active_game_id}/next", post(next_question))
}

#[utoipa::path(
    get,
    path = "/admin/games",
    tag = "admin",
    responses((status = 200, description = "Games sessions can be started from", body = [GameSummary]))
)]
/// List the game templates of the catalog.
pub async fn list_games(State(state): State<SharedState>) -> Json<Vec<GameSummary>> {
    Json(session_service::list_games(&state))
}

#[utoipa::path(
    post,
    path = "/admin/start/{game_id}",
    tag = "admin",
    params(("game_id" = String, Path, description = "Identifier of the game template")),
    responses(
        (status = 201, description = "Session created", body = StartSessionResponse),
        (status = 400, description = "Game id is not an integer"),
        (status = 404, description = "Unknown game")
    )
)]
/// Create a session from a game template and start its broadcast loop.
pub async fn start_session(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<(StatusCode, Json<StartSessionResponse>), AppError> {
    let game_id = session_service::parse_game_id(&game_id)?;
    let response = session_service::start_session(&state, game_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/admin/{active_game_id}",
    tag = "admin",
    params(("active_game_id" = String, Path, description = "Code of the session")),
    responses(
        (status = 200, description = "Host player registered", body = AdminPage),
        (status = 404, description = "Unknown session")
    )
)]
/// Register a host player and return the data of the host page.
pub async fn admin_page(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
) -> Result<Json<AdminPage>, AppError> {
    let page = session_service::open_admin_page(&state, &active_game_id).await?;
    Ok(Json(page))
}

#[utoipa::path(
    delete,
    path = "/admin/{active_game_id}",
    tag = "admin",
    params(("active_game_id" = String, Path, description = "Code of the session")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session")
    )
)]
/// Close a session and evict it from the directory.
pub async fn close_session(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
) -> Result<StatusCode, AppError> {
    session_service::close_session(&state, &active_game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/{active_game_id}/next",
    tag = "admin",
    params(("active_game_id" = String, Path, description = "Code of the session")),
    responses(
        (status = 200, description = "Moved to the next question", body = QuestionAdvanced),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No more questions")
    )
)]
/// Advance the session to its next question.
pub async fn next_question(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
) -> Result<Json<QuestionAdvanced>, AppError> {
    let advanced = session_service::advance_question(&state, &active_game_id).await?;
    Ok(Json(advanced))
}

#[utoipa::path(
    get,
    path = "/admin/join/{active_game_id}",
    tag = "admin",
    params(("active_game_id" = String, Path, description = "Code of the session")),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 404, description = "Unknown session")
    )
)]
/// Upgrade to the host WebSocket; the first frame must be the host's player id.
pub async fn admin_ws_handler(
    State(state): State<SharedState>,
    Path(active_game_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let session = session_service::find_session(&state, &active_game_id)?;
    let code = active_game_id.clone();

    Ok(ws
        .on_failed_upgrade(move |err| {
            warn!(session = %code, error = %err, "admin websocket upgrade failed");
        })
        .on_upgrade(move |socket| websocket_service::handle_admin_socket(state, session, socket))
        .into_response())
}
