use std::sync::LazyLock;

use regex::Regex;

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:https?://)?(?:www\.|m\.)?youtube\.com/watch\?(?:[^#]*&)?v=([^&#]+)",
        r"(?i)(?:https?://)?youtu\.be/([^?&#/]+)",
        r"(?i)(?:https?://)?(?:www\.)?youtube\.com/shorts/([^?&#/]+)",
        r"(?i)(?:https?://)?(?:www\.)?youtube\.com/embed/([^?&#/]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static video id pattern"))
    .collect()
});

/// Extract the video id from the URL shapes the analysis server accepts.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
