// SolusVM client API over reqwest

mod parse;

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::instrument;

use crate::cache::StatsSource;
use crate::config::Credentials;
use crate::models::VpsStats;

/// RackNerd's SolusVM client API endpoint.
pub const API_URL: &str = "https://nerdvm.racknerd.com/api/client/command.php";

/// Upstream request timeout; a hung upstream becomes a `FetchError` instead
/// of blocking callers indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream fetch failure. The cache treats every kind the same way: nothing
/// is cached and all waiters of the refresh receive the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream rejected credentials: {0}")]
    Auth(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("unexpected response shape: {0}")]
    Parse(String),
}

pub struct SolusRepo {
    client: reqwest::Client,
    credentials: Credentials,
    api_url: String,
}

impl SolusRepo {
    pub fn new(credentials: Credentials) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            credentials,
            api_url: API_URL.to_string(),
        })
    }

    /// Point the repo at a different endpoint (tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// One authenticated fetch of the full stats snapshot.
    #[instrument(skip(self), fields(repo = "solus", operation = "fetch"))]
    pub async fn fetch(&self) -> Result<VpsStats, FetchError> {
        let params = [
            ("key", self.credentials.key.as_str()),
            ("hash", self.credentials.hash.as_str()),
            ("action", "info"),
            ("bw", "true"),
            ("hdd", "true"),
            ("mem", "true"),
        ];
        let response = self
            .client
            .post(&self.api_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("upstream returned {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Upstream(format!("upstream returned {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        parse::parse_response(&body)
    }
}

impl StatsSource for SolusRepo {
    fn fetch(&self) -> impl Future<Output = Result<VpsStats, FetchError>> + Send {
        SolusRepo::fetch(self)
    }
}
