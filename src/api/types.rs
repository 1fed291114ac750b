//! Wire types for the DCA ranking backend's JSON API.
//!
//! Every fetch yields an independent snapshot; fields the backend may omit
//! carry `#[serde(default)]` so a sparse payload still parses.

use crate::status::Phase;
use serde::Deserialize;

/// One poll of `/api/activity-status`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityStatus {
    #[serde(default)]
    pub status: Phase,
    #[serde(default)]
    pub current_operation: Option<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub stats: Stats,
}

/// Scan progress block. `percentage` is backend-derived and rendered as
/// received; the client never recomputes it from `processed / total`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub current_symbol: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub errors: u32,
}

/// Backend uptime and request counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub successful_calculations: u64,
    #[serde(default)]
    pub api_calls: u64,
}

/// Envelope for `/api/dca-ranking`.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<RankingEntry>,
    #[serde(default)]
    pub summary: Option<RankingSummary>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One ranked symbol. `symbol` is the unique key within a snapshot and
/// `rank` is unique with no tie rule defined.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingEntry {
    pub symbol: String,
    pub rank: u32,
    pub pnl_percentage: f64,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub hours_tracked: u32,
    pub avg_hourly_pnl: f64,
    pub action: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingSummary {
    #[serde(default)]
    pub hours_passed: u32,
    #[serde(default)]
    pub total_symbols: u32,
    #[serde(default)]
    pub total_invested: f64,
    #[serde(default)]
    pub total_current_value: f64,
    #[serde(default)]
    pub total_pnl: f64,
    #[serde(default)]
    pub avg_pnl_percentage: f64,
    #[serde(default)]
    pub profitable_symbols: u32,
    #[serde(default)]
    pub profitable_rate: f64,
}

/// Envelope for `/api/dca-symbol/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<SymbolDetail>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Full per-symbol DCA performance breakdown.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolDetail {
    pub symbol: String,
    pub pnl_percentage: f64,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub winning_buys: u32,
    pub total_buys: u32,
    pub avg_buy_price: f64,
    pub current_price: f64,
    pub total_tokens: f64,
    pub current_value: f64,
    pub action: String,
    #[serde(default)]
    pub hourly_details: Vec<HourlyDetail>,
}

/// One simulated hourly buy within a symbol's detail view.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyDetail {
    pub hour: u32,
    pub buy_price: f64,
    pub tokens_bought: f64,
    pub investment: f64,
    pub current_value: f64,
    pub pnl: f64,
    pub pnl_percentage: f64,
    pub is_winning: bool,
}
