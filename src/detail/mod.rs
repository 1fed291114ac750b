//! Per-symbol detail loading.
//!
//! Opening a detail view renders a loading placeholder synchronously, then
//! the fetched breakdown or an error placeholder. There is no cross-symbol
//! cache: every open re-fetches.

use crate::api::{ApiError, DcaBackend, SymbolDetail};
use tracing::warn;

/// The three states a detail view can render.
#[derive(Debug, Clone)]
pub enum DetailView {
    /// Shown immediately, before the request resolves.
    Loading { symbol: String },
    Loaded(Box<SymbolDetail>),
    Failed { symbol: String, message: String },
}

impl DetailView {
    pub fn loading(symbol: impl Into<String>) -> Self {
        DetailView::Loading {
            symbol: symbol.into(),
        }
    }
}

/// Resolve the loading placeholder into its final state.
pub async fn load(backend: &dyn DcaBackend, symbol: &str) -> DetailView {
    match backend.symbol_detail(symbol).await {
        Ok(detail) => DetailView::Loaded(Box::new(detail)),
        Err(ApiError::Backend(message)) => {
            warn!(symbol = symbol, error = %message, "symbol detail rejected by backend");
            DetailView::Failed {
                symbol: symbol.to_string(),
                message,
            }
        }
        Err(ApiError::Transport(e)) => {
            warn!(symbol = symbol, error = %e, "symbol detail fetch failed");
            DetailView::Failed {
                symbol: symbol.to_string(),
                message: "Failed to load symbol details".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ActivityStatus;
    use crate::api::RankingPayload;
    use async_trait::async_trait;

    struct StubBackend {
        detail: Result<SymbolDetail, String>,
    }

    #[async_trait]
    impl DcaBackend for StubBackend {
        async fn activity_status(&self) -> Result<ActivityStatus, ApiError> {
            unimplemented!("not used by detail tests")
        }
        async fn ranking(&self) -> Result<RankingPayload, ApiError> {
            unimplemented!("not used by detail tests")
        }
        async fn symbol_detail(&self, _symbol: &str) -> Result<SymbolDetail, ApiError> {
            self.detail.clone().map_err(ApiError::Backend)
        }
    }

    fn detail(symbol: &str) -> SymbolDetail {
        SymbolDetail {
            symbol: symbol.to_string(),
            pnl_percentage: 2.5,
            total_pnl: 150.0,
            win_rate: 66.7,
            winning_buys: 4,
            total_buys: 6,
            avg_buy_price: 101.5,
            current_price: 104.0,
            total_tokens: 59.1,
            current_value: 6150.0,
            action: "🟢 BUY".to_string(),
            hourly_details: Vec::new(),
        }
    }

    #[tokio::test]
    async fn load_resolves_to_loaded() {
        let backend = StubBackend {
            detail: Ok(detail("BTCUSDT")),
        };
        let view = load(&backend, "BTCUSDT").await;
        match view {
            DetailView::Loaded(d) => assert_eq!(d.symbol, "BTCUSDT"),
            other => panic!("expected Loaded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn backend_failure_keeps_its_message() {
        let backend = StubBackend {
            detail: Err("symbol not tracked".to_string()),
        };
        let view = load(&backend, "NOPEUSDT").await;
        match view {
            DetailView::Failed { symbol, message } => {
                assert_eq!(symbol, "NOPEUSDT");
                assert_eq!(message, "symbol not tracked");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn loading_placeholder_is_synchronous() {
        match DetailView::loading("ETHUSDT") {
            DetailView::Loading { symbol } => assert_eq!(symbol, "ETHUSDT"),
            other => panic!("expected Loading, got {:?}", other),
        }
    }
}
