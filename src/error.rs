use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("GITHUB_TOKEN not found")]
    MissingToken,

    #[error("GITHUB_REPOSITORY not found")]
    MissingRepository,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream error from {endpoint}: {message}")]
    Upstream {
        endpoint: String,
        message: String,
        status: Option<u16>,
    },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gist content error: {0}")]
    GistContent(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("render error: {0}")]
    Render(String),
}

impl StatsError {
    /// HTTP status carried by upstream failures, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Errors the gist reader treats as "no history yet" rather than fatal.
    pub fn is_expected_absence(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::Request(_) | Self::Json(_) | Self::GistContent(_)
        )
    }
}
