//! ytbuddy Core Library
//!
//! Session state, backend gateway and player lifecycle for analyzing YouTube
//! videos and chatting about their content.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod gateway;
pub mod normalize;
pub mod persistence;
pub mod player;
pub mod store;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use config::{Backend, BackendConfig, ClientConfig};
pub use controller::{AnalysisController, PendingAnalysis, PendingQuestion, Screen};
pub use error::{Result, YtBuddyError};
pub use format::{
    format_chat_message, format_key_points, format_player_status, format_session_readable,
    format_summary, format_tab, format_timestamp, format_transcript,
};
pub use gateway::{BackendGateway, HealthStatus, HttpGateway};
pub use persistence::{FileStatePort, MemoryStatePort, PersistedState, StatePort};
pub use player::{PlayerAdapter, PlayerEmbed, PlayerPhase, PlayerStatus};
pub use store::{SessionStore, SessionToken};
pub use types::{ChatMessage, Mode, ModeInfo, Role, Session, Tab};
pub use youtube::{extract_video_id, watch_url};
