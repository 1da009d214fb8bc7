use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    error::{Result, YtBuddyError},
    normalize::{answer_fragments, error_reason, session_from_payload},
    types::{ChatMessage, Mode, Session},
    youtube::extract_video_id,
};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub reachable: bool,
    pub status: Option<String>,
    pub payload: Option<Value>,
}

impl HealthStatus {
    fn unreachable() -> Self {
        Self {
            reachable: false,
            status: None,
            payload: None,
        }
    }
}

/// The remote analysis service.
///
/// Implementations perform network I/O only; applying results to session or
/// chat state is the caller's job.
pub trait BackendGateway {
    async fn analyze(&self, url: &str) -> Result<Session>;
    async fn ask(&self, video_id: &str, question: &str, mode: Mode) -> Result<Vec<ChatMessage>>;
    async fn health(&self) -> HealthStatus;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    video_id: &'a str,
    question: &'a str,
    mode: Mode,
}

pub struct HttpGateway {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Server-side usage metrics from `/api/usage`, best-effort.
    pub async fn usage(&self) -> Option<Value> {
        let endpoint = self.config.endpoint("/api/usage");
        let response = match self.client.get(&endpoint).timeout(HEALTH_TIMEOUT).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(status = %r.status(), "usage request rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "usage request failed");
                return None;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => Some(body.get("metrics").cloned().unwrap_or(body)),
            Err(e) => {
                warn!(error = %e, "usage response is not JSON");
                None
            }
        }
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

impl BackendGateway for HttpGateway {
    async fn analyze(&self, url: &str) -> Result<Session> {
        let url = url.trim();
        if url.is_empty() {
            return Err(YtBuddyError::EmptyUrl);
        }

        debug!(url, "POST /api/analyze");
        let response = self
            .client
            .post(self.config.endpoint("/api/analyze"))
            .timeout(self.config.analyze_timeout)
            .json(&AnalyzeRequest { url })
            .send()
            .await
            .map_err(|e| YtBuddyError::AnalysisFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YtBuddyError::AnalysisFailed {
                reason: error_reason(&body, &status_text(status)),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| YtBuddyError::AnalysisFailed {
                reason: format!("invalid analysis response: {}", e),
            })?;

        let mut session = session_from_payload(&payload);
        if session.video_id.is_empty() {
            session.video_id =
                extract_video_id(url).ok_or_else(|| YtBuddyError::AnalysisFailed {
                    reason: "response did not include a video id".to_string(),
                })?;
        }

        info!(
            video_id = %session.video_id,
            transcript_chars = session.transcript.len(),
            key_points = session.key_points.len(),
            "analysis received"
        );
        Ok(session)
    }

    async fn ask(&self, video_id: &str, question: &str, mode: Mode) -> Result<Vec<ChatMessage>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(YtBuddyError::EmptyQuestion);
        }

        debug!(video_id, mode = mode.as_str(), "POST /api/ask");
        let response = self
            .client
            .post(self.config.endpoint("/api/ask"))
            .json(&AskRequest {
                video_id,
                question,
                mode,
            })
            .send()
            .await
            .map_err(|e| YtBuddyError::QuestionFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YtBuddyError::QuestionFailed {
                reason: error_reason(&body, &status_text(status)),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| YtBuddyError::QuestionFailed {
                reason: format!("invalid answer response: {}", e),
            })?;

        Ok(answer_fragments(&payload))
    }

    async fn health(&self) -> HealthStatus {
        let endpoint = self.config.endpoint("/health");
        debug!(endpoint = %endpoint, "checking backend health");

        let response = match self.client.get(&endpoint).timeout(HEALTH_TIMEOUT).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "health check failed");
                return HealthStatus::unreachable();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "health check rejected");
            return HealthStatus {
                reachable: false,
                status: Some(status_text(status)),
                payload: None,
            };
        }

        let payload = response.json::<Value>().await.ok();
        let reported = payload
            .as_ref()
            .and_then(|p| p.get("status"))
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(status = ?reported, "health check response");

        HealthStatus {
            reachable: true,
            status: reported,
            payload,
        }
    }
}
