use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::catalog::GameTemplate;

/// Entry of the game catalog listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: u32,
    pub name: String,
    pub question_count: usize,
}

impl From<GameTemplate> for GameSummary {
    fn from(game: GameTemplate) -> Self {
        Self {
            id: game.id,
            name: game.name,
            question_count: game.questions.len(),
        }
    }
}

/// Returned once a session has been created from a template.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub active_game_id: String,
}

/// Data the host page needs: the session and the host's own player id.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPage {
    pub name: String,
    pub active_game_id: String,
    /// Id the host sends as first frame on `/admin/join/{activeGameId}`.
    pub player_id: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAdvanced {
    pub current_question_index: usize,
}
