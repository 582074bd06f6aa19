use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{format_system_time, ws::PlayerSummary},
    state::session::{SessionPhase, SessionSnapshot},
};

/// Lifecycle phase exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    Created,
    Running,
    Closed,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Created => Self::Created,
            SessionPhase::Running => Self::Running,
            SessionPhase::Closed => Self::Closed,
        }
    }
}

/// Public summary of a live session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub active_game_id: String,
    pub name: String,
    pub phase: VisibleSessionPhase,
    pub current_question_index: usize,
    pub question_count: usize,
    /// Players already admitted, in admission order.
    pub players: Vec<PlayerSummary>,
    /// Players waiting for the next broadcast tick.
    pub pending_count: usize,
    /// Players with a live WebSocket attached.
    pub connected_count: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<SessionSnapshot> for SessionSummary {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            active_game_id: snapshot.code,
            name: snapshot.name,
            phase: snapshot.phase.into(),
            current_question_index: snapshot.current_question_index,
            question_count: snapshot.question_count,
            players: snapshot.players.iter().map(PlayerSummary::from).collect(),
            pending_count: snapshot.pending_count,
            connected_count: snapshot.connected_count,
            created_at: format_system_time(snapshot.created_at),
        }
    }
}
