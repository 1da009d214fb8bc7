use std::sync::Arc;

use tracing::debug;

use crate::error::YtBuddyError;

pub const INVALID_VIDEO_ID: &str = "Invalid video ID.";
pub const LOAD_FAILED: &str = "Failed to load video";
pub const INIT_FAILED: &str = "Player initialization failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub video_id: Option<String>,
    pub phase: PlayerPhase,
    pub error_message: Option<String>,
}

impl PlayerStatus {
    fn uninitialized() -> Self {
        Self {
            video_id: None,
            phase: PlayerPhase::Uninitialized,
            error_message: None,
        }
    }

    pub fn to_error(&self) -> Option<YtBuddyError> {
        match self.phase {
            PlayerPhase::Error => Some(YtBuddyError::PlayerError {
                message: self.error_message.clone().unwrap_or_else(|| LOAD_FAILED.to_string()),
            }),
            _ => None,
        }
    }
}

/// An external embeddable player.
pub trait PlayerEmbed {
    /// Create the embed for `video_id` and wait for it to signal ready or error.
    async fn load(&self, video_id: &str) -> Result<(), String>;
    /// Release the embed created for `video_id`.
    fn destroy(&self, video_id: &str);
}

impl<E: PlayerEmbed> PlayerEmbed for Arc<E> {
    async fn load(&self, video_id: &str) -> Result<(), String> {
        (**self).load(video_id).await
    }

    fn destroy(&self, video_id: &str) {
        (**self).destroy(video_id)
    }
}

/// Pending readiness for one `set_video` call.
#[derive(Debug)]
pub struct LoadTicket {
    video_id: String,
    generation: u64,
}

impl LoadTicket {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

pub struct PlayerAdapter<E: PlayerEmbed> {
    embed: E,
    status: PlayerStatus,
    embedded: Option<String>,
    generation: u64,
}

impl<E: PlayerEmbed> PlayerAdapter<E> {
    pub fn new(embed: E) -> Self {
        Self {
            embed,
            status: PlayerStatus::uninitialized(),
            embedded: None,
            generation: 0,
        }
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    /// Point the player at `video_id`. Returns a ticket when a new embed must
    /// be loaded; `None` when the id is unchanged or invalid.
    pub fn set_video(&mut self, video_id: &str) -> Option<LoadTicket> {
        let video_id = video_id.trim();
        if !video_id.is_empty()
            && self.status.video_id.as_deref() == Some(video_id)
            && self.status.phase != PlayerPhase::Uninitialized
        {
            return None;
        }

        self.teardown();
        self.generation += 1;

        if video_id.is_empty() {
            self.status = PlayerStatus {
                video_id: None,
                phase: PlayerPhase::Error,
                error_message: Some(INVALID_VIDEO_ID.to_string()),
            };
            return None;
        }

        self.embedded = Some(video_id.to_string());
        self.status = PlayerStatus {
            video_id: Some(video_id.to_string()),
            phase: PlayerPhase::Loading,
            error_message: None,
        };
        Some(LoadTicket {
            video_id: video_id.to_string(),
            generation: self.generation,
        })
    }

    /// Apply the embed's readiness signal. Signals for a superseded video, or
    /// arriving after the player left `loading`, are ignored.
    pub fn resolve(&mut self, ticket: LoadTicket, result: Result<(), String>) -> bool {
        if ticket.generation != self.generation || self.status.phase != PlayerPhase::Loading {
            debug!(video_id = %ticket.video_id, "ignoring stale player signal");
            return false;
        }

        match result {
            Ok(()) => {
                self.status.phase = PlayerPhase::Ready;
            }
            Err(message) => {
                self.status.phase = PlayerPhase::Error;
                self.status.error_message = Some(message);
            }
        }
        true
    }

    pub async fn load(&mut self, video_id: &str) -> &PlayerStatus {
        if let Some(ticket) = self.set_video(video_id) {
            let result = self.embed.load(ticket.video_id()).await;
            self.resolve(ticket, result);
        }
        &self.status
    }

    pub fn dispose(&mut self) {
        self.teardown();
        self.generation += 1;
        self.status = PlayerStatus::uninitialized();
    }

    fn teardown(&mut self) {
        if let Some(video_id) = self.embedded.take() {
            debug!(video_id = %video_id, "destroying player embed");
            self.embed.destroy(&video_id);
        }
    }
}

impl<E: PlayerEmbed> Drop for PlayerAdapter<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingEmbed {
        pub loads: Mutex<Vec<String>>,
        pub destroyed: Mutex<Vec<String>>,
        pub failures: HashMap<String, String>,
    }

    impl RecordingEmbed {
        pub fn failing(video_id: &str, message: &str) -> Self {
            Self {
                failures: HashMap::from([(video_id.to_string(), message.to_string())]),
                ..Default::default()
            }
        }

        pub fn destroyed(&self) -> Vec<String> {
            self.destroyed.lock().unwrap().clone()
        }
    }

    impl PlayerEmbed for RecordingEmbed {
        async fn load(&self, video_id: &str) -> Result<(), String> {
            self.loads.lock().unwrap().push(video_id.to_string());
            match self.failures.get(video_id) {
                Some(message) => Err(message.clone()),
                None => Ok(()),
            }
        }

        fn destroy(&self, video_id: &str) {
            self.destroyed.lock().unwrap().push(video_id.to_string());
        }
    }

    #[tokio::test]
    async fn loads_to_ready() {
        let mut player = PlayerAdapter::new(RecordingEmbed::default());
        assert_eq!(player.status().phase, PlayerPhase::Uninitialized);

        let status = player.load("abc123").await;
        assert_eq!(status.phase, PlayerPhase::Ready);
        assert_eq!(status.video_id.as_deref(), Some("abc123"));
        assert!(status.to_error().is_none());
    }

    #[tokio::test]
    async fn embed_failure_goes_to_error() {
        let mut player = PlayerAdapter::new(RecordingEmbed::failing("bad", LOAD_FAILED));
        let status = player.load("bad").await;
        assert_eq!(status.phase, PlayerPhase::Error);
        assert_eq!(status.error_message.as_deref(), Some(LOAD_FAILED));
        assert!(matches!(status.to_error(), Some(YtBuddyError::PlayerError { .. })));
    }

    #[test]
    fn empty_video_id_errors_without_loading() {
        let mut player = PlayerAdapter::new(RecordingEmbed::default());
        assert!(player.set_video("").is_none());
        assert_eq!(player.status().phase, PlayerPhase::Error);
        assert_eq!(player.status().error_message.as_deref(), Some(INVALID_VIDEO_ID));
    }

    #[tokio::test]
    async fn changing_video_tears_down_previous_embed() {
        let embed = Arc::new(RecordingEmbed::default());
        let mut player = PlayerAdapter::new(embed.clone());

        player.load("one").await;
        player.load("one").await;
        player.load("two").await;

        assert_eq!(*embed.loads.lock().unwrap(), vec!["one", "two"]);
        assert_eq!(embed.destroyed(), vec!["one"]);

        player.dispose();
        assert_eq!(embed.destroyed(), vec!["one", "two"]);
        assert_eq!(player.status().phase, PlayerPhase::Uninitialized);
    }

    #[test]
    fn superseded_signal_is_ignored() {
        let mut player = PlayerAdapter::new(RecordingEmbed::default());
        let first = player.set_video("one").unwrap();
        let second = player.set_video("two").unwrap();

        assert!(!player.resolve(first, Err(LOAD_FAILED.into())));
        assert_eq!(player.status().phase, PlayerPhase::Loading);

        assert!(player.resolve(second, Ok(())));
        assert_eq!(player.status().phase, PlayerPhase::Ready);
        assert_eq!(player.status().video_id.as_deref(), Some("two"));
    }

    #[test]
    fn dropping_adapter_destroys_embed() {
        let embed = Arc::new(RecordingEmbed::default());
        {
            let mut player = PlayerAdapter::new(embed.clone());
            let _ticket = player.set_video("abc123");
        }
        assert_eq!(embed.destroyed(), vec!["abc123"]);
    }
}
