//! Pure, derived table views over the cached snapshot.
//!
//! Filter and sort are transient view state: every render starts from the
//! full cached snapshot, never from a previously filtered result, so
//! switching filters cannot compound.

use crate::api::types::{RankingEntry, RankingSummary};
use std::cmp::Ordering;

/// Action filter buttons. `Buy`/`Sell` match by substring on the entry's
/// `action` field; `Profitable` selects strictly positive P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionFilter {
    #[default]
    All,
    Buy,
    Sell,
    Profitable,
}

impl ActionFilter {
    pub fn matches(&self, entry: &RankingEntry) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Buy => entry.action.contains("BUY"),
            ActionFilter::Sell => entry.action.contains("SELL"),
            ActionFilter::Profitable => entry.pnl_percentage > 0.0,
        }
    }
}

/// Render class for the action column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Buy,
    Sell,
    Hold,
}

pub fn classify_action(action: &str) -> ActionClass {
    if action.contains("BUY") {
        ActionClass::Buy
    } else if action.contains("SELL") {
        ActionClass::Sell
    } else {
        ActionClass::Hold
    }
}

/// Win-rate color band for a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinRateBand {
    /// >= 70%
    High,
    /// 50–69%
    Medium,
    /// < 50%
    Low,
}

pub fn win_rate_band(win_rate: f64) -> WinRateBand {
    if win_rate >= 70.0 {
        WinRateBand::High
    } else if win_rate >= 50.0 {
        WinRateBand::Medium
    } else {
        WinRateBand::Low
    }
}

/// Sign class for P&L cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlClass {
    Positive,
    Negative,
    Neutral,
}

pub fn pnl_class(value: f64) -> PnlClass {
    if value > 0.0 {
        PnlClass::Positive
    } else if value < 0.0 {
        PnlClass::Negative
    } else {
        PnlClass::Neutral
    }
}

/// Top-3 ranks get a highlight class.
pub fn rank_highlight(rank: u32) -> Option<u32> {
    (rank <= 3).then_some(rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Rank,
    Symbol,
    PnlPercentage,
    TotalPnl,
    WinRate,
    HoursTracked,
    AvgHourlyPnl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn flip(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Transient view state: current filter, symbol search, sort column and
/// direction. Holds no data; [`TableState::view`] derives rows from
/// whatever snapshot the caller passes in.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    pub filter: ActionFilter,
    pub search: String,
    sort: Option<(SortColumn, SortOrder)>,
}

impl TableState {
    pub fn set_filter(&mut self, filter: ActionFilter) {
        self.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn sort(&self) -> Option<(SortColumn, SortOrder)> {
        self.sort
    }

    /// First click on a new column sorts descending; clicking the same
    /// column again flips the direction.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort = Some(match self.sort {
            Some((current, order)) if current == column => (column, order.flip()),
            _ => (column, SortOrder::Descending),
        });
    }

    /// Derive the rendered row order from the full snapshot.
    pub fn view<'a>(&self, entries: &'a [RankingEntry]) -> Vec<&'a RankingEntry> {
        let search = self.search.to_lowercase();
        let mut rows: Vec<&RankingEntry> = entries
            .iter()
            .filter(|e| self.filter.matches(e))
            .filter(|e| search.is_empty() || e.symbol.to_lowercase().contains(&search))
            .collect();

        if let Some((column, order)) = self.sort {
            rows.sort_by(|a, b| {
                let ord = compare(a, b, column);
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        rows
    }
}

fn compare(a: &RankingEntry, b: &RankingEntry, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Rank => a.rank.cmp(&b.rank),
        SortColumn::Symbol => a.symbol.cmp(&b.symbol),
        SortColumn::PnlPercentage => a.pnl_percentage.total_cmp(&b.pnl_percentage),
        SortColumn::TotalPnl => a.total_pnl.total_cmp(&b.total_pnl),
        SortColumn::WinRate => a.win_rate.total_cmp(&b.win_rate),
        SortColumn::HoursTracked => a.hours_tracked.cmp(&b.hours_tracked),
        SortColumn::AvgHourlyPnl => a.avg_hourly_pnl.total_cmp(&b.avg_hourly_pnl),
    }
}

/// Placeholder shown for an empty snapshot. Not an error state.
pub const NO_DATA_TITLE: &str = "No data available";
pub const NO_DATA_HINT: &str = "Make sure at least 1 hour has passed since 00:00 UTC";

/// Summary widgets derived from a snapshot's aggregate block.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub hours_tracked: u32,
    pub total_invested: String,
    pub total_value: String,
    pub total_pnl: String,
    pub total_pnl_class: PnlClass,
    pub avg_pnl: String,
    pub avg_pnl_class: PnlClass,
    pub profitable_rate: String,
}

pub fn summary_view(summary: &RankingSummary) -> SummaryView {
    SummaryView {
        hours_tracked: summary.hours_passed,
        total_invested: format_currency(summary.total_invested, false),
        total_value: format_currency(summary.total_current_value, false),
        total_pnl: format_currency(summary.total_pnl, true),
        total_pnl_class: pnl_class(summary.total_pnl),
        avg_pnl: format!("{}%", summary.avg_pnl_percentage),
        avg_pnl_class: pnl_class(summary.avg_pnl_percentage),
        profitable_rate: format!("{}%", summary.profitable_rate),
    }
}

/// `$1,234.56` with thousands grouping; `show_sign` prefixes `+`/`-`.
pub fn format_currency(amount: f64, show_sign: bool) -> String {
    let formatted = group_thousands(amount.abs());
    if show_sign {
        if amount >= 0.0 {
            format!("+${}", formatted)
        } else {
            format!("-${}", formatted)
        }
    } else if amount < 0.0 {
        format!("-${}", formatted)
    } else {
        format!("${}", formatted)
    }
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (integral, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(integral.len() + integral.len() / 3);
    for (i, c) in integral.chars().enumerate() {
        if i > 0 && (integral.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}.{}", grouped, fraction)
}

/// External chart link for a symbol (opened in a separate browser context,
/// not an API call).
pub fn chart_url(symbol: &str) -> String {
    format!("https://www.tradingview.com/chart/?symbol=BINANCE:{}", symbol)
}

/// One-line clipboard summary for a ranked symbol.
pub fn copy_line(entry: &RankingEntry) -> String {
    format!(
        "{}: {}% P&L, {}% Win Rate, {}",
        entry.symbol, entry.pnl_percentage, entry.win_rate, entry.action
    )
}
