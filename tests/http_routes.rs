use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use trivia_back::{config::AppConfig, routes, state::AppState};

fn app() -> Router {
    routes::router(AppState::new(AppConfig::default()))
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn start(app: &Router) -> String {
    let (status, body) = call(app, Method::POST, "/admin/start/1").await;
    assert_eq!(status, StatusCode::CREATED);
    body["activeGameId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn lists_catalog_games() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/admin/games").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["name"], "Simple Game");
    assert_eq!(body[0]["questionCount"], 1);
}

#[tokio::test]
async fn start_session_returns_code() {
    let app = app();
    let code = start(&app).await;
    assert_eq!(code.len(), 3);

    let (status, body) = call(&app, Method::GET, &format!("/sessions/{code}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Simple Game");
    assert_eq!(body["phase"], "running");
    assert_eq!(body["currentQuestionIndex"], 0);
    assert_eq!(body["players"].as_array().unwrap().len(), 0);
    assert_eq!(body["pendingCount"], 0);
}

#[tokio::test]
async fn non_integer_game_id_is_a_bad_request() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/admin/start/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("gameId must be an integer")
    );
}

#[tokio::test]
async fn unknown_game_and_session_are_not_found() {
    let app = app();
    let (status, _) = call(&app, Method::POST, "/admin/start/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/admin/zzz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/sessions/zzz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_page_registers_pending_host() {
    let app = app();
    let code = start(&app).await;

    let (status, page) = call(&app, Method::GET, &format!("/admin/{code}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["playerId"], 1);
    assert_eq!(page["activeGameId"], code.as_str());
    assert_eq!(page["name"], "Simple Game");

    let (_, summary) = call(&app, Method::GET, &format!("/sessions/{code}")).await;
    assert_eq!(summary["pendingCount"], 1);
}

#[tokio::test]
async fn next_question_until_exhausted() {
    let app = app();
    let code = start(&app).await;

    let (status, body) = call(&app, Method::POST, &format!("/admin/{code}/next")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentQuestionIndex"], 1);

    let (status, _) = call(&app, Method::POST, &format!("/admin/{code}/next")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn closing_a_session_evicts_it() {
    let app = app();
    let code = start(&app).await;

    let (_, health) = call(&app, Method::GET, "/healthcheck").await;
    assert_eq!(health["activeSessions"], 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/admin/{code}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/sessions/{code}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = call(&app, Method::GET, "/healthcheck").await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["activeSessions"], 0);
}
