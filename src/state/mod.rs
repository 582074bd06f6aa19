pub mod directory;
pub mod session;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::catalog::{GameCatalog, StaticCatalog},
};

pub use self::directory::SessionDirectory;
pub use self::session::{Player, PlayerConnection, PlayerId, PlayerRole, Session, SessionError};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the game catalog, and live sessions.
pub struct AppState {
    config: AppConfig,
    catalog: Arc<dyn GameCatalog>,
    sessions: SessionDirectory,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`], serving the games from `config`.
    pub fn new(config: AppConfig) -> SharedState {
        let catalog = Arc::new(StaticCatalog::new(config.games().to_vec()));
        Self::with_catalog(config, catalog)
    }

    /// Construct the state around an arbitrary catalog implementation.
    pub fn with_catalog(config: AppConfig, catalog: Arc<dyn GameCatalog>) -> SharedState {
        let sessions = SessionDirectory::new(config.session_code_length());
        Arc::new(Self {
            config,
            catalog,
            sessions,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read-only game template catalog.
    pub fn catalog(&self) -> &dyn GameCatalog {
        self.catalog.as_ref()
    }

    /// Registry of live sessions keyed by their code.
    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }
}
