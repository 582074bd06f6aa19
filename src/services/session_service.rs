use std::sync::Arc;

use tracing::info;

use crate::{
    dao::catalog::GameId,
    dto::{
        admin::{AdminPage, GameSummary, QuestionAdvanced, StartSessionResponse},
        session::SessionSummary,
    },
    error::ServiceError,
    services::broadcast_loop::start_broadcast_loop,
    state::{PlayerRole, Session, SharedState},
};

/// List the templates sessions can be started from.
pub fn list_games(state: &SharedState) -> Vec<GameSummary> {
    state
        .catalog()
        .list_games()
        .into_iter()
        .map(GameSummary::from)
        .collect()
}

/// Parse a raw `gameId` path segment.
pub fn parse_game_id(raw: &str) -> Result<GameId, ServiceError> {
    raw.parse::<GameId>()
        .map_err(|_| ServiceError::InvalidInput("gameId must be an integer.".into()))
}

/// Resolve a live session from its code.
pub fn find_session(state: &SharedState, code: &str) -> Result<Arc<Session>, ServiceError> {
    state
        .sessions()
        .lookup(code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))
}

/// Create a session from a catalog template, register it and start its broadcast loop.
pub async fn start_session(
    state: &SharedState,
    game_id: GameId,
) -> Result<StartSessionResponse, ServiceError> {
    let template = state
        .catalog()
        .find_game(game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;

    let session = state.sessions().create_session(template);
    start_broadcast_loop(Arc::clone(&session), state.config().tick_interval()).await?;

    info!(session = %session.code(), game_id, "session started");
    Ok(StartSessionResponse {
        active_game_id: session.code().to_string(),
    })
}

/// Register a new host player for the session and return what the host page needs.
pub async fn open_admin_page(state: &SharedState, code: &str) -> Result<AdminPage, ServiceError> {
    let session = find_session(state, code)?;
    let player_id = session
        .add_player(state.config().admin_name(), PlayerRole::Admin)
        .await?;

    info!(session = %code, player_id, "host player registered");
    Ok(AdminPage {
        name: session.name().to_string(),
        active_game_id: session.code().to_string(),
        player_id,
    })
}

/// Move the session to its next question.
pub async fn advance_question(
    state: &SharedState,
    code: &str,
) -> Result<QuestionAdvanced, ServiceError> {
    let session = find_session(state, code)?;
    let current_question_index = session.advance_question().await?;
    info!(session = %code, index = current_question_index, "question advanced");
    Ok(QuestionAdvanced {
        current_question_index,
    })
}

/// Stop a session's loop, release its connections and evict it from the directory.
pub async fn close_session(state: &SharedState, code: &str) -> Result<(), ServiceError> {
    let session = state
        .sessions()
        .remove(code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))?;
    session.close().await;
    info!(session = %code, "session closed");
    Ok(())
}

pub async fn session_summary(
    state: &SharedState,
    code: &str,
) -> Result<SessionSummary, ServiceError> {
    let session = find_session(state, code)?;
    Ok(session.snapshot().await.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[test]
    fn game_id_must_be_numeric() {
        assert_eq!(parse_game_id("1").unwrap(), 1);
        assert!(matches!(
            parse_game_id("one"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn start_session_registers_running_session() {
        let state = AppState::new(AppConfig::default());
        let response = start_session(&state, 1).await.unwrap();

        let summary = session_summary(&state, &response.active_game_id)
            .await
            .unwrap();
        assert_eq!(summary.name, "Simple Game");
        assert_eq!(summary.current_question_index, 0);
        assert!(summary.players.is_empty());
        assert_eq!(summary.pending_count, 0);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            start_session(&state, 42).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.sessions().is_empty());
    }

    #[tokio::test]
    async fn admin_page_adds_pending_admin() {
        let state = AppState::new(AppConfig::default());
        let code = start_session(&state, 1).await.unwrap().active_game_id;

        let page = open_admin_page(&state, &code).await.unwrap();
        assert_eq!(page.player_id, 1);
        assert_eq!(page.name, "Simple Game");

        let pending = find_session(&state, &code)
            .unwrap()
            .pending_players()
            .await;
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_admin());
        assert_eq!(pending[0].name, "admin");
    }

    #[tokio::test]
    async fn closed_session_is_evicted() {
        let state = AppState::new(AppConfig::default());
        let code = start_session(&state, 1).await.unwrap().active_game_id;
        let session = find_session(&state, &code).unwrap();

        close_session(&state, &code).await.unwrap();
        assert!(session.shutdown_token().is_cancelled());
        assert!(matches!(
            find_session(&state, &code),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            close_session(&state, &code).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn advance_past_last_question_is_rejected() {
        let state = AppState::new(AppConfig::default());
        let code = start_session(&state, 1).await.unwrap().active_game_id;

        assert_eq!(
            advance_question(&state, &code)
                .await
                .unwrap()
                .current_question_index,
            1
        );
        assert!(matches!(
            advance_question(&state, &code).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
