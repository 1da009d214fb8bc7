use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{Result, YtBuddyError},
    persistence::{PersistedState, StatePort},
    types::{ChatMessage, Session},
};

/// Identifies one activation of a session. A new token is issued every time a
/// session becomes active, so results computed for an earlier activation can
/// be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct ActiveSession {
    token: SessionToken,
    session: Session,
}

/// Holds the single active session and its chat history.
///
/// Persistence is touched only by [`start_session`](Self::start_session) and
/// [`end_session`](Self::end_session); chat stays in memory.
pub struct SessionStore<P: StatePort> {
    port: P,
    active: Option<ActiveSession>,
    chat: Vec<ChatMessage>,
}

impl<P: StatePort> SessionStore<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            active: None,
            chat: Vec::new(),
        }
    }

    pub fn start_session(&mut self, session: Session) -> Result<SessionToken> {
        if session.video_id.trim().is_empty() {
            return Err(YtBuddyError::MissingVideoId);
        }

        if let Err(e) = self.port.save(&PersistedState::new(session.clone())) {
            warn!(error = %e, "failed to persist session");
        }

        let token = self.activate(session);
        info!(video_id = self.video_id().unwrap_or_default(), "session started");
        Ok(token)
    }

    pub fn end_session(&mut self) {
        if let Some(active) = self.active.take() {
            info!(video_id = %active.session.video_id, "session ended");
        }
        self.chat.clear();
        if let Err(e) = self.port.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Load the persisted snapshot and make its session active, with a fresh
    /// chat. Unreadable snapshots are cleared and treated as absent.
    pub fn restore_from_persisted(&mut self) -> Option<&Session> {
        let persisted = match self.port.load() {
            Ok(None) => None,
            Ok(Some(PersistedState { session: Some(session) })) => Some(session),
            Ok(Some(PersistedState { session: None })) => {
                warn!("persisted session has no video id, discarding it");
                self.discard_persisted();
                None
            }
            Err(e) => {
                warn!(error = %e, "persisted session is unreadable, discarding it");
                self.discard_persisted();
                None
            }
        };

        match persisted {
            Some(session) => {
                debug!(video_id = %session.video_id, "restored persisted session");
                self.activate(session);
            }
            None => {
                self.active = None;
                self.chat.clear();
            }
        }
        self.session()
    }

    /// Append fragments atomically and in order if `token` still names the
    /// active session. Returns `false` when the fragments were discarded.
    pub fn append_chat_messages(
        &mut self,
        token: SessionToken,
        fragments: impl IntoIterator<Item = ChatMessage>,
    ) -> bool {
        if !self.is_current(token) {
            debug!("discarding chat messages for an inactive session");
            return false;
        }
        self.chat.extend(fragments);
        true
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.token() == Some(token)
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn video_id(&self) -> Option<&str> {
        self.session().map(|s| s.video_id.as_str())
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    fn discard_persisted(&mut self) {
        if let Err(e) = self.port.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    fn activate(&mut self, session: Session) -> SessionToken {
        let token = SessionToken::new();
        self.active = Some(ActiveSession { token, session });
        self.chat = vec![ChatMessage::greeting()];
        token
    }
}
