use chrono::{DateTime, Local, Utc};

use crate::{
    player::{PlayerPhase, PlayerStatus},
    types::{ChatMessage, Mode, Role, Session, Tab},
    youtube::watch_url,
};

/// Format a message timestamp as local HH:MM
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn format_summary(session: &Session) -> String {
    if session.summary.trim().is_empty() {
        "No summary available".to_string()
    } else {
        session.summary.clone()
    }
}

pub fn format_key_points(session: &Session) -> String {
    if session.key_points.is_empty() {
        return "No key points available".to_string();
    }
    session
        .key_points
        .iter()
        .map(|point| format!("• {}", point))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_transcript(session: &Session) -> String {
    if session.transcript.trim().is_empty() {
        "Transcript not available".to_string()
    } else {
        session.transcript.clone()
    }
}

pub fn format_tab(session: &Session, tab: Tab) -> String {
    let mut output = String::new();
    match tab {
        Tab::Summary => {
            output.push_str("## Video Summary\n\n");
            output.push_str(&format_summary(session));
        }
        Tab::KeyPoints => {
            output.push_str("## Key Points\n\n");
            output.push_str(&format_key_points(session));
        }
    }
    output.push('\n');
    output
}

pub fn format_session_readable(session: &Session, tab: Tab, with_transcript: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", watch_url(&session.video_id)));
    if let Some(language) = &session.language {
        output.push_str(&format!("**Language:** {}\n\n", language));
    }

    output.push_str(&format_tab(session, tab));

    if with_transcript {
        output.push_str("\n## Transcript\n\n");
        output.push_str(&format_transcript(session));
        output.push('\n');
    }

    output
}

pub fn format_player_status(status: &PlayerStatus) -> String {
    match status.phase {
        PlayerPhase::Uninitialized => "Player: not loaded".to_string(),
        PlayerPhase::Loading => "Player: loading...".to_string(),
        PlayerPhase::Ready => format!(
            "Player: ready ({})",
            status.video_id.as_deref().map(watch_url).unwrap_or_default()
        ),
        PlayerPhase::Error => format!(
            "Player: {}",
            status.error_message.as_deref().unwrap_or("error")
        ),
    }
}

fn mode_tag(mode: Option<Mode>) -> String {
    match mode {
        Some(Mode::Buddy) => " [buddy]".to_string(),
        Some(Mode::Beyond) => " [beyond]".to_string(),
        Some(Mode::Default) | None => String::new(),
    }
}

/// Render one chat line: `[HH:MM] you: ...` / `[HH:MM] bot [beyond]: ...`
pub fn format_chat_message(message: &ChatMessage) -> String {
    let time = message
        .created_at
        .as_ref()
        .map(|at| format!("[{}] ", format_timestamp(at)))
        .unwrap_or_default();
    let who = match message.role {
        Role::User => "you".to_string(),
        Role::Assistant => format!("bot{}", mode_tag(message.mode)),
    };
    format!("{}{}: {}", time, who, message.text)
}
