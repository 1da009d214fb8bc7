use thiserror::Error;

#[derive(Error, Debug)]
pub enum YtBuddyError {
    #[error("Analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Question failed: {reason}")]
    QuestionFailed { reason: String },

    #[error("Question text is empty")]
    EmptyQuestion,

    #[error("Video URL is empty")]
    EmptyUrl,

    #[error("Session has no video id")]
    MissingVideoId,

    #[error("No analysis data available")]
    NoAnalysisData,

    #[error("No active session")]
    NoActiveSession,

    #[error("Player error: {message}")]
    PlayerError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, YtBuddyError>;
