use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GREETING: &str =
    "Hi! I'm here to help you understand this video better. Ask me anything about the content!";

pub const APOLOGY: &str = "Sorry, I couldn't process your question right now.";

/// The analysis payload of one video, as returned by `/api/analyze`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub video_id: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Session {
    /// A session whose transcript, summary and key points are all empty
    /// carries no renderable analysis.
    pub fn has_analysis(&self) -> bool {
        !self.transcript.is_empty() || !self.summary.is_empty() || !self.key_points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Transcript-grounded answers only.
    #[default]
    Default,
    /// General-knowledge answers, transcript ignored.
    Buddy,
    /// Transcript answer followed by a general-knowledge answer.
    Beyond,
}

pub struct ModeInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Default, Mode::Buddy, Mode::Beyond];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Buddy => "buddy",
            Mode::Beyond => "beyond",
        }
    }

    pub fn from_wire(value: &str) -> Option<Mode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Mode::Default),
            "buddy" => Some(Mode::Buddy),
            "beyond" => Some(Mode::Beyond),
            _ => None,
        }
    }

    pub fn info(&self) -> ModeInfo {
        match self {
            Mode::Default => ModeInfo {
                title: "Transcript Mode",
                description: "Answers strictly from video content",
                example: "What does the video say about...?",
            },
            Mode::Buddy => ModeInfo {
                title: "Buddy Mode",
                description: "General knowledge answers (ignores transcript)",
                example: "Hey buddy, tell me about...",
            },
            Mode::Beyond => ModeInfo {
                title: "Beyond Mode",
                description: "Transcript answer + general knowledge",
                example: "Beyond the transcript, explain...",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// `None` for messages not produced by any answering mode (greeting, apology).
    pub mode: Option<Mode>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn greeting() -> Self {
        Self {
            role: Role::Assistant,
            text: GREETING.to_string(),
            mode: None,
            created_at: None,
        }
    }

    pub fn apology() -> Self {
        Self {
            role: Role::Assistant,
            text: APOLOGY.to_string(),
            mode: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn user(text: impl Into<String>, mode: Mode) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            mode: Some(mode),
            created_at: Some(Utc::now()),
        }
    }

    pub fn assistant(text: impl Into<String>, mode: Mode) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            mode: Some(mode),
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Summary,
    KeyPoints,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Summary => "AI Summary",
            Tab::KeyPoints => "Key Points",
        }
    }
}
