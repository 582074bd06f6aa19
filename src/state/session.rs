use std::time::SystemTime;

use axum::extract::ws::{Message, Utf8Bytes};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::catalog::{GameTemplate, Question},
    dto::ws::{PlayerSummary, ServerMessage},
};

/// Opaque code identifying a live session.
pub type SessionCode = String;
/// Player identifier, unique within one session.
pub type PlayerId = u32;

/// Display name reserved for the host player.
pub const ADMIN_NAME: &str = "admin";

/// Errors raised by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("session broadcast loop already started")]
    AlreadyStarted,
    #[error("session has not been started")]
    NotStarted,
    #[error("no more questions in this session")]
    NoMoreQuestions,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("player {player_id} does not have the {expected:?} role")]
    RoleMismatch {
        player_id: PlayerId,
        expected: PlayerRole,
    },
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created and registered, broadcast loop not running yet.
    Created,
    /// Broadcast loop active.
    Running,
    /// Loop cancelled and connections released.
    Closed,
}

/// Role assigned to a player by the entry point that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    Player,
    Admin,
}

/// One participant of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: PlayerRole,
}

impl Player {
    pub fn is_admin(&self) -> bool {
        self.role == PlayerRole::Admin
    }
}

/// The writer channel is gone; the socket task has ended.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Sending half of a player's WebSocket.
///
/// The session only references the channel to push frames; the socket task owns the
/// actual connection and decides when it ends.
#[derive(Debug, Clone)]
pub struct PlayerConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl PlayerConnection {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Identifier distinguishing this connection from later reconnections.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a text frame for the writer task.
    pub fn send_text(&self, payload: Utf8Bytes) -> Result<(), ConnectionClosed> {
        self.tx
            .send(Message::Text(payload))
            .map_err(|_| ConnectionClosed)
    }

    /// Ask the writer task to close the socket.
    pub fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}

/// Outcome of one promotion of pending players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionReport {
    /// Players moved into the visible roster, in join order.
    pub promoted: Vec<PlayerId>,
    /// Connections the `PLAYERS_ADDED` frame was queued on.
    pub delivered: usize,
    /// Connections whose writer was already gone.
    pub failed: usize,
}

/// Read-only view of a session at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub code: SessionCode,
    pub name: String,
    pub phase: SessionPhase,
    pub current_question_index: usize,
    pub question_count: usize,
    pub players: Vec<Player>,
    pub pending_count: usize,
    /// Players, pending or admitted, with an attached connection.
    pub connected_count: usize,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Pending,
    Admitted,
}

#[derive(Debug)]
struct PlayerRecord {
    player: Player,
    admission: Admission,
    connection: Option<PlayerConnection>,
}

/// Everything guarded by the session lock.
#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    current_question_index: usize,
    next_player_id: PlayerId,
    // Keyed by id, so iteration follows join order. Promotion always admits every
    // pending record, hence admitted records form a prefix of this map.
    roster: IndexMap<PlayerId, PlayerRecord>,
}

impl SessionState {
    fn players_with(&self, admission: Admission) -> impl Iterator<Item = &Player> {
        self.roster
            .values()
            .filter(move |record| record.admission == admission)
            .map(|record| &record.player)
    }

    fn summaries_with(&self, admission: Admission) -> Vec<PlayerSummary> {
        self.players_with(admission).map(PlayerSummary::from).collect()
    }

    /// Push `message` to every admitted player holding a connection.
    ///
    /// Returns `(delivered, failed)`. A failed write never stops delivery to the others.
    fn broadcast_to_admitted(&self, code: &str, message: &ServerMessage) -> (usize, usize) {
        let Some(payload) = encode(message) else {
            return (0, 0);
        };

        let mut delivered = 0;
        let mut failed = 0;
        for record in self.roster.values() {
            if record.admission != Admission::Admitted {
                continue;
            }
            let Some(connection) = record.connection.as_ref() else {
                continue;
            };
            match connection.send_text(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(session = %code, player_id = record.player.id, error = %err, "failed to deliver session event");
                    failed += 1;
                }
            }
        }
        (delivered, failed)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

/// Serialize an outbound event once so it can be shared across connections.
fn encode(message: &ServerMessage) -> Option<Utf8Bytes> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload.into()),
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{message:?}`");
            None
        }
    }
}

/// One trivia game in progress.
#[derive(Debug)]
pub struct Session {
    code: SessionCode,
    name: String,
    questions: Vec<Question>,
    created_at: SystemTime,
    state: Mutex<SessionState>,
    shutdown: CancellationToken,
}

impl Session {
    /// Build a fresh session from a catalog template.
    pub fn new(code: SessionCode, template: GameTemplate) -> Self {
        Self {
            code,
            name: template.name,
            questions: template.questions,
            created_at: SystemTime::now(),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Created,
                current_question_index: 0,
                next_player_id: 0,
                roster: IndexMap::new(),
            }),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Token cancelled once the session is closed.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register a new player as pending and return its identifier.
    ///
    /// Nobody else learns about the player until the next broadcast tick.
    pub async fn add_player(
        &self,
        name: impl Into<String>,
        role: PlayerRole,
    ) -> Result<PlayerId, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;

        state.next_player_id += 1;
        let id = state.next_player_id;
        state.roster.insert(
            id,
            PlayerRecord {
                player: Player {
                    id,
                    name: name.into(),
                    role,
                },
                admission: Admission::Pending,
                connection: None,
            },
        );
        Ok(id)
    }

    /// Attach a connection to a player, whether still pending or already admitted.
    ///
    /// Returns `false` and changes nothing when the id is unknown or the session is closed.
    pub async fn attach_connection(&self, player_id: PlayerId, connection: PlayerConnection) -> bool {
        let mut state = self.state.lock().await;
        if state.ensure_open().is_err() {
            warn!(session = %self.code, player_id, "ignoring connection for closed session");
            return false;
        }
        self.attach_locked(&mut state, player_id, connection)
    }

    /// Send `INIT_GAME` with the admitted roster to a new connection, then attach it.
    ///
    /// Both steps run under the session lock, so the init frame is always queued before
    /// any broadcast the connection will receive. Nothing is sent or attached unless the
    /// session is open and the player exists with the `expected` role.
    pub async fn initialize_connection(
        &self,
        player_id: PlayerId,
        expected: PlayerRole,
        connection: PlayerConnection,
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let role = state
            .roster
            .get(&player_id)
            .map(|record| record.player.role)
            .ok_or(SessionError::UnknownPlayer(player_id))?;
        if role != expected {
            return Err(SessionError::RoleMismatch {
                player_id,
                expected,
            });
        }

        let init = ServerMessage::InitGame {
            players: state.summaries_with(Admission::Admitted),
        };
        if let Some(payload) = encode(&init) {
            if let Err(err) = connection.send_text(payload) {
                warn!(session = %self.code, player_id, error = %err, "failed to send init event");
            }
        }

        self.attach_locked(&mut state, player_id, connection);
        Ok(())
    }

    fn attach_locked(
        &self,
        state: &mut SessionState,
        player_id: PlayerId,
        connection: PlayerConnection,
    ) -> bool {
        match state.roster.get_mut(&player_id) {
            Some(record) => {
                record.connection = Some(connection);
                true
            }
            None => {
                warn!(session = %self.code, player_id, "ignoring connection for unknown player");
                false
            }
        }
    }

    /// Drop the player's connection if it is still the one identified by `connection_id`.
    pub async fn detach_connection(&self, player_id: PlayerId, connection_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        let Some(record) = state.roster.get_mut(&player_id) else {
            return false;
        };
        if record
            .connection
            .as_ref()
            .is_some_and(|connection| connection.id() == connection_id)
        {
            record.connection = None;
            return true;
        }
        false
    }

    /// Admit every pending player and tell the already admitted ones about them.
    ///
    /// Returns `None` without touching anything when nobody is pending.
    pub async fn promote_pending(&self) -> Option<PromotionReport> {
        let mut state = self.state.lock().await;

        let promoted: Vec<PlayerId> = state
            .players_with(Admission::Pending)
            .map(|player| player.id)
            .collect();
        if promoted.is_empty() {
            return None;
        }

        let message = ServerMessage::PlayersAdded {
            players: state.summaries_with(Admission::Pending),
        };
        let (delivered, failed) = state.broadcast_to_admitted(&self.code, &message);

        for id in &promoted {
            if let Some(record) = state.roster.get_mut(id) {
                record.admission = Admission::Admitted;
            }
        }

        Some(PromotionReport {
            promoted,
            delivered,
            failed,
        })
    }

    /// Move to the next question and notify admitted players.
    pub async fn advance_question(&self) -> Result<usize, SessionError> {
        let mut state = self.state.lock().await;
        match state.phase {
            SessionPhase::Created => return Err(SessionError::NotStarted),
            SessionPhase::Closed => return Err(SessionError::Closed),
            SessionPhase::Running => {}
        }
        if state.current_question_index >= self.questions.len() {
            return Err(SessionError::NoMoreQuestions);
        }

        state.current_question_index += 1;
        let index = state.current_question_index;
        state.broadcast_to_admitted(&self.code, &ServerMessage::QuestionChanged { index });
        Ok(index)
    }

    /// Flip the session from `Created` to `Running`.
    pub async fn mark_running(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        match state.phase {
            SessionPhase::Created => {
                state.phase = SessionPhase::Running;
                Ok(())
            }
            SessionPhase::Running => Err(SessionError::AlreadyStarted),
            SessionPhase::Closed => Err(SessionError::Closed),
        }
    }

    /// Stop the broadcast loop and release every connection.
    ///
    /// Returns `false` if the session was already closed.
    pub async fn close(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.phase == SessionPhase::Closed {
            return false;
        }
        state.phase = SessionPhase::Closed;
        self.shutdown.cancel();

        for record in state.roster.values_mut() {
            if let Some(connection) = record.connection.take() {
                connection.close();
            }
        }
        true
    }

    /// Admitted players, in admission order.
    pub async fn players(&self) -> Vec<Player> {
        let state = self.state.lock().await;
        state.players_with(Admission::Admitted).cloned().collect()
    }

    /// Players waiting for the next tick, in join order.
    pub async fn pending_players(&self) -> Vec<Player> {
        let state = self.state.lock().await;
        state.players_with(Admission::Pending).cloned().collect()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn current_question_index(&self) -> usize {
        self.state.lock().await.current_question_index
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            phase: state.phase,
            current_question_index: state.current_question_index,
            question_count: self.questions.len(),
            players: state.players_with(Admission::Admitted).cloned().collect(),
            pending_count: state.players_with(Admission::Pending).count(),
            connected_count: state
                .roster
                .values()
                .filter(|record| record.connection.is_some())
                .count(),
            created_at: self.created_at,
        }
    }
}
