use std::time::Duration;

use tracing::{debug, info, warn};
use ytbuddy_core::{
    PlayerEmbed,
    player::{INIT_FAILED, LOAD_FAILED},
    watch_url,
};

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Terminal stand-in for the embedded player: a video is "ready" when
/// YouTube's oEmbed endpoint can describe it.
pub struct OembedEmbed {
    client: reqwest::Client,
    endpoint: String,
}

impl OembedEmbed {
    pub fn new() -> Self {
        Self::with_endpoint(OEMBED_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for OembedEmbed {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerEmbed for OembedEmbed {
    async fn load(&self, video_id: &str) -> Result<(), String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", watch_url(video_id).as_str()), ("format", "json")])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, video_id, "player probe failed");
                INIT_FAILED.to_string()
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), video_id, "video is not embeddable");
            return Err(LOAD_FAILED.to_string());
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            warn!(error = %e, video_id, "invalid oEmbed response");
            LOAD_FAILED.to_string()
        })?;
        if let Some(title) = body["title"].as_str() {
            info!(video_id, title, "player ready");
        }
        Ok(())
    }

    fn destroy(&self, video_id: &str) {
        debug!(video_id, "player released");
    }
}
