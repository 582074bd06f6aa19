use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the trivia backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::admin::list_games,
        crate::routes::admin::start_session,
        crate::routes::admin::admin_page,
        crate::routes::admin::close_session,
        crate::routes::admin::next_question,
        crate::routes::admin::admin_ws_handler,
        crate::routes::play::player_ws_handler,
        crate::routes::play::get_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::GameSummary,
            crate::dto::admin::StartSessionResponse,
            crate::dto::admin::AdminPage,
            crate::dto::admin::QuestionAdvanced,
            crate::dto::session::SessionSummary,
            crate::dto::session::VisibleSessionPhase,
            crate::dto::ws::PlayerSummary,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Host operations on games and sessions"),
        (name = "players", description = "Player WebSocket and session lookup"),
    )
)]
pub struct ApiDoc;
