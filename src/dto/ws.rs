use serde::Serialize;
use utoipa::ToSchema;

use crate::state::session::Player;

/// Player as seen by clients; the connection never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: u32,
    pub name: String,
    pub admin: bool,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            admin: player.is_admin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Events pushed to player WebSocket clients.
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent once to a freshly attached connection with the visible roster.
    InitGame { players: Vec<PlayerSummary> },
    /// Sent to connected players when pending players are admitted.
    PlayersAdded { players: Vec<PlayerSummary> },
    /// Sent when the host moves to another question.
    QuestionChanged { index: usize },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::session::PlayerRole;

    #[test]
    fn players_added_wire_shape() {
        let host = Player {
            id: 1,
            name: "admin".into(),
            role: PlayerRole::Admin,
        };
        let message = ServerMessage::PlayersAdded {
            players: vec![PlayerSummary::from(&host)],
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "PLAYERS_ADDED",
                "players": [{ "id": 1, "name": "admin", "admin": true }],
            })
        );
    }

    #[test]
    fn init_game_uses_screaming_tag() {
        let message = ServerMessage::InitGame { players: vec![] };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "type": "INIT_GAME", "players": [] })
        );
    }
}
