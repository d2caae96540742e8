use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::time::Duration;

pub const NOT_DONE_STATUS: &str = "NOTDONE";

/// Search state reported by the result endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultStatus {
    NotDone,
    /// Any other status string ends the poll cycle; the sentinel is kept verbatim.
    Done(String),
}

impl ResultStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, ResultStatus::Done(_))
    }
}

impl From<String> for ResultStatus {
    fn from(value: String) -> Self {
        if value == NOT_DONE_STATUS {
            ResultStatus::NotDone
        } else {
            ResultStatus::Done(value)
        }
    }
}

impl From<ResultStatus> for String {
    fn from(value: ResultStatus) -> Self {
        match value {
            ResultStatus::NotDone => NOT_DONE_STATUS.to_string(),
            ResultStatus::Done(sentinel) => sentinel,
        }
    }
}

/// Body of the result endpoint. Payloads are still base64 encoded.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub status: ResultStatus,
    #[serde(rename = "res_completa", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub complete: String,
    #[serde(rename = "res_detallada", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub detailed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResult {
    pub status: ResultStatus,
    pub complete: String,
    pub detailed: String,
}

impl DecodedResult {
    pub fn is_empty(&self) -> bool {
        self.complete.is_empty() && self.detailed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub status: ResultStatus,
    pub complete: String,
    pub detailed: String,
    pub html: String,
    pub readiness_polls: u32,
    pub result_polls: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SearchOutcome {
    pub fn found_nothing(&self) -> bool {
        self.complete.is_empty() && self.detailed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub readiness_interval: Duration,
    pub result_interval: Duration,
    /// `None` keeps polling until the server answers.
    pub max_readiness_polls: Option<u32>,
    pub max_result_polls: Option<u32>,
    pub request_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            readiness_interval: Duration::from_millis(1_000),
            result_interval: Duration::from_millis(500),
            max_readiness_polls: None,
            max_result_polls: None,
            request_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub index_ready: String,
    pub start_search: String,
    pub search_result: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            index_ready: "/ajax/index/ready".to_string(),
            start_search: "/ajax/buscar".to_string(),
            search_result: "/ajax/buscar/resultado".to_string(),
        }
    }
}

/// The query exactly as typed, or `None` when it is blank.
pub fn submitted_query(input: &str) -> Option<String> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input.to_string())
    }
}
