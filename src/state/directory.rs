use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::{info, warn};

use crate::{
    dao::catalog::GameTemplate,
    services::session_code::generate_session_code,
    state::session::{Session, SessionCode},
};

/// Attempts per code length before the directory starts drawing longer codes.
const CODE_ATTEMPTS_PER_LENGTH: usize = 16;

/// Process-wide registry of live sessions keyed by their code.
pub struct SessionDirectory {
    sessions: DashMap<SessionCode, Arc<Session>>,
    code_length: usize,
}

impl SessionDirectory {
    pub fn new(code_length: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            code_length: code_length.max(1),
        }
    }

    /// Create a session from `template` under a code no live session uses, and register it.
    pub fn create_session(&self, template: GameTemplate) -> Arc<Session> {
        let mut rng = rand::rng();
        let mut length = self.code_length;

        loop {
            for _ in 0..CODE_ATTEMPTS_PER_LENGTH {
                let code = generate_session_code(&mut rng, length);
                if let Entry::Vacant(slot) = self.sessions.entry(code.clone()) {
                    let session = Arc::new(Session::new(code, template));
                    slot.insert(Arc::clone(&session));
                    info!(session = %session.code(), game = %session.name(), "session registered");
                    return session;
                }
            }
            warn!(length, "session code space crowded; drawing longer codes");
            length += 1;
        }
    }

    pub fn lookup(&self, code: &str) -> Option<Arc<Session>> {
        self.sessions.get(code).map(|entry| Arc::clone(entry.value()))
    }

    /// Evict a session from the directory, returning it if it was registered.
    pub fn remove(&self, code: &str) -> Option<Arc<Session>> {
        self.sessions.remove(code).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::dao::catalog::builtin_games;

    #[tokio::test]
    async fn created_session_is_registered_and_empty() {
        let directory = SessionDirectory::new(3);
        let session = directory.create_session(builtin_games().remove(0));

        let found = directory.lookup(session.code()).unwrap();
        assert!(Arc::ptr_eq(&found, &session));
        assert_eq!(found.code().len(), 3);
        assert_eq!(found.current_question_index().await, 0);
        assert!(found.players().await.is_empty());
        assert!(found.pending_players().await.is_empty());
    }

    #[test]
    fn lookup_unknown_code_is_none() {
        let directory = SessionDirectory::new(3);
        assert!(directory.lookup("zzz").is_none());
    }

    #[test]
    fn codes_stay_unique_when_space_is_exhausted() {
        // 26 one-letter codes exist; the rest must spill into longer ones.
        let directory = SessionDirectory::new(1);
        let codes: HashSet<String> = (0..40)
            .map(|_| {
                directory
                    .create_session(builtin_games().remove(0))
                    .code()
                    .to_string()
            })
            .collect();
        assert_eq!(codes.len(), 40);
        assert_eq!(directory.len(), 40);
    }

    #[test]
    fn remove_evicts_session() {
        let directory = SessionDirectory::new(3);
        let session = directory.create_session(builtin_games().remove(0));
        assert!(directory.remove(session.code()).is_some());
        assert!(directory.lookup(session.code()).is_none());
        assert!(directory.is_empty());
    }
}
