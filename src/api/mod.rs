//! HTTP client for the DCA ranking backend.
//!
//! Three GET endpoints, no request bodies, no authentication:
//!   GET /api/activity-status    → current backend phase + progress + stats
//!   GET /api/dca-ranking        → full ranking snapshot
//!   GET /api/dca-symbol/{sym}   → per-symbol DCA breakdown
//!
//! A backend-reported failure (`status != "success"`) is distinct from a
//! transport failure: callers keep their cached data in both cases but
//! surface the backend message only for the former.

pub mod types;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use types::{
    ActivityStatus, DetailResponse, HourlyDetail, Progress, RankingEntry, RankingResponse,
    RankingSummary, Stats, SymbolDetail,
};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network unreachable, timeout, or a non-JSON response body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered but reported a logical failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A successfully fetched ranking snapshot, pre-unwrapped from its envelope.
#[derive(Debug, Clone)]
pub struct RankingPayload {
    pub entries: Vec<RankingEntry>,
    pub summary: Option<RankingSummary>,
    pub last_update: Option<String>,
}

/// Fetch seam for the monitor session. The production implementation is
/// [`ApiClient`]; tests drive the session with a stub.
#[async_trait]
pub trait DcaBackend: Send + Sync {
    async fn activity_status(&self) -> Result<ActivityStatus, ApiError>;
    async fn ranking(&self) -> Result<RankingPayload, ApiError>;
    async fn symbol_detail(&self, symbol: &str) -> Result<SymbolDetail, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DcaBackend for ApiClient {
    async fn activity_status(&self) -> Result<ActivityStatus, ApiError> {
        let url = format!("{}/api/activity-status", self.base_url);
        let status: ActivityStatus = self.client.get(&url).send().await?.json().await?;
        debug!(phase = %status.status, operation = ?status.current_operation, "activity status");
        Ok(status)
    }

    async fn ranking(&self) -> Result<RankingPayload, ApiError> {
        let url = format!("{}/api/dca-ranking", self.base_url);
        let resp: RankingResponse = self.client.get(&url).send().await?.json().await?;

        if resp.status != "success" {
            return Err(ApiError::Backend(
                resp.message.unwrap_or_else(|| "unknown backend error".to_string()),
            ));
        }

        debug!(
            entries = resp.data.len(),
            last_update = ?resp.last_update,
            "ranking fetched"
        );

        Ok(RankingPayload {
            entries: resp.data,
            summary: resp.summary,
            last_update: resp.last_update,
        })
    }

    async fn symbol_detail(&self, symbol: &str) -> Result<SymbolDetail, ApiError> {
        let url = format!("{}/api/dca-symbol/{}", self.base_url, symbol);
        let resp: DetailResponse = self.client.get(&url).send().await?.json().await?;

        if resp.status != "success" {
            return Err(ApiError::Backend(
                resp.message.unwrap_or_else(|| "unknown backend error".to_string()),
            ));
        }

        resp.data.ok_or_else(|| {
            ApiError::Backend(format!("no detail data returned for {}", symbol))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8089/".to_string());
        assert_eq!(client.base_url(), "http://localhost:8089");
    }
}
