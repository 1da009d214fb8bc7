use std::time::Duration;

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "YTBUDDY_API_URL";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Local,
    Hosted,
}

pub struct BackendConfig {
    pub base_url: &'static str,
    pub analyze_timeout: Duration,
}

impl Backend {
    pub fn config(&self) -> BackendConfig {
        match self {
            Backend::Local => BackendConfig {
                base_url: "http://127.0.0.1:8000",
                analyze_timeout: Duration::from_secs(600),
            },
            // Transcription on the shared space runs on CPU.
            Backend::Hosted => BackendConfig {
                base_url: "https://ayushman18-ytbuddy.hf.space",
                analyze_timeout: Duration::from_secs(900),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Hosted => "hosted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Analysis downloads and transcribes the whole video server-side.
    pub analyze_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            analyze_timeout: Backend::Local.config().analyze_timeout,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn for_backend(backend: &Backend) -> Self {
        let config = backend.config();
        Self {
            analyze_timeout: config.analyze_timeout,
            ..Self::new(config.base_url)
        }
    }

    /// Resolve the base URL: explicit override, then `YTBUDDY_API_URL`, then the
    /// backend's default.
    pub fn resolve(backend: &Backend, api_url: Option<&str>) -> Self {
        let env_url = std::env::var(API_URL_ENV).ok();
        let explicit = api_url
            .map(str::to_string)
            .or(env_url)
            .filter(|url| !url.trim().is_empty());

        match explicit {
            Some(url) => Self {
                base_url: url.trim().trim_end_matches('/').to_string(),
                ..Self::for_backend(backend)
            },
            None => Self::for_backend(backend),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_backend(&Backend::default())
    }
}
