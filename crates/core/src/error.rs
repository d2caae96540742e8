use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot decode payload {field}: {details}")]
    Decode { field: String, details: String },

    #[error("invalid response from {endpoint}: {details}")]
    BackendResponse { endpoint: String, details: String },

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("search session was cancelled")]
    Cancelled,

    #[error("gave up on {stage} after {attempts} poll(s)")]
    Exhausted { stage: PollStage, attempts: u32 },

    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The two poll cycles a search goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollStage {
    Readiness,
    Results,
}

impl std::fmt::Display for PollStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStage::Readiness => f.write_str("index readiness"),
            PollStage::Results => f.write_str("search results"),
        }
    }
}

pub type Result<T, E = PollError> = std::result::Result<T, E>;
