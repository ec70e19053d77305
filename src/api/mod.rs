//! Backend API -- the two endpoints the dashboard talks to.

pub mod http;

use crate::report::Report;
use thiserror::Error;

pub use self::http::HttpApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status}")]
    Status { status: u16 },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Reply to a start-analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResponse {
    pub status: u16,
    /// `message` field of the JSON body, when the backend sent one.
    pub message: Option<String>,
}

impl StartResponse {
    /// 202 is the only status that means the job was started.
    pub fn is_accepted(&self) -> bool {
        self.status == 202
    }
}

/// Trait for the dashboard backend.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch the full report collection.
    async fn fetch_reports(&self) -> Result<Vec<Report>, ApiError>;

    /// Ask the backend to start the analysis named by `slug`.
    /// Any HTTP status is a successful reply here; callers judge it.
    async fn start_analysis(&self, slug: &str) -> Result<StartResponse, ApiError>;
}
