//! The monitor session.
//!
//! One owned object holds all mutable client state: the status reconciler,
//! the ranking cache with its fetch sequencing, the transient table view
//! state, and the notification queue. Fetching itself is injected (any
//! [`DcaBackend`]), so multiple independent sessions can run side by side
//! and tests drive one without a network.

use crate::api::{ApiError, RankingPayload};
use crate::notify::{NotificationCenter, NotificationLevel};
use crate::poller::PollerEvent;
use crate::ranking::view::{summary_view, SummaryView, TableState, NO_DATA_HINT, NO_DATA_TITLE};
use crate::ranking::{FetchTicket, RankingCache, RankingSnapshot};
use crate::status::{Reconciler, StatusFrame};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const BUSY_MESSAGE: &str = "System is busy! Please wait for current operation to complete.";

/// What the ranking table should render.
#[derive(Debug)]
pub enum TableView<'a> {
    /// No snapshot yet, or an empty one. Explicitly not an error.
    Empty {
        title: &'static str,
        hint: &'static str,
    },
    Rows(Vec<&'a crate::api::RankingEntry>),
}

/// Result of applying a completed ranking fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot replaced and table recomputed.
    Applied,
    /// A later-started fetch already applied; response discarded.
    Stale,
    /// Backend answered with a logical failure; cache untouched.
    BackendError,
    /// Network or decode failure; cache untouched.
    TransportError,
}

pub struct Monitor {
    reconciler: Reconciler,
    cache: RankingCache,
    table: TableState,
    notifications: NotificationCenter,
    refreshes_in_flight: usize,
}

impl Monitor {
    pub fn new(notification_ttl: Duration) -> Self {
        Self {
            reconciler: Reconciler::new(),
            cache: RankingCache::new(),
            table: TableState::default(),
            notifications: NotificationCenter::new(notification_ttl),
            refreshes_in_flight: 0,
        }
    }

    // --- Status polling ---

    /// Feed one poller event through the reconciler.
    pub fn handle_poll(&mut self, event: PollerEvent, now: DateTime<Utc>) -> StatusFrame {
        match event {
            PollerEvent::Status(status) => self.reconciler.apply(&status, now),
            PollerEvent::ConnectionError => self.reconciler.apply_connection_error(),
        }
    }

    // --- Ranking refresh ---

    /// Start a ranking refresh, unless the backend is mid-scan, in which
    /// case this is a no-op that posts a warning instead of queuing.
    pub fn begin_refresh(&mut self, now: Instant) -> Option<FetchTicket> {
        if self.reconciler.phase().is_some_and(|p| p.is_busy()) {
            warn!("refresh rejected: scan in progress");
            self.notifications
                .push(NotificationLevel::Warning, BUSY_MESSAGE, now);
            return None;
        }
        self.refreshes_in_flight += 1;
        Some(self.cache.begin_fetch())
    }

    /// True while at least one ranking fetch is outstanding; drives the
    /// refresh button's loading state.
    pub fn is_refreshing(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    /// Apply a completed ranking fetch in completion order.
    pub fn apply_refresh(
        &mut self,
        ticket: FetchTicket,
        result: Result<RankingPayload, ApiError>,
        now: Instant,
    ) -> RefreshOutcome {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);

        match result {
            Ok(payload) => {
                if self.cache.apply(ticket, payload) {
                    info!(
                        entries = self.cache.snapshot().map_or(0, |s| s.entries.len()),
                        "ranking snapshot replaced"
                    );
                    self.notifications.push(
                        NotificationLevel::Success,
                        "DCA ranking updated successfully!",
                        now,
                    );
                    RefreshOutcome::Applied
                } else {
                    RefreshOutcome::Stale
                }
            }
            Err(ApiError::Backend(message)) => {
                warn!(error = %message, "ranking refresh rejected by backend");
                self.notifications.push(
                    NotificationLevel::Error,
                    format!("Error: {}", message),
                    now,
                );
                RefreshOutcome::BackendError
            }
            Err(ApiError::Transport(e)) => {
                warn!(error = %e, "ranking refresh failed");
                self.notifications.push(
                    NotificationLevel::Error,
                    "Failed to fetch ranking data",
                    now,
                );
                RefreshOutcome::TransportError
            }
        }
    }

    // --- Derived views ---

    pub fn snapshot(&self) -> Option<&RankingSnapshot> {
        self.cache.snapshot()
    }

    /// Current table rows under the active filter, search and sort.
    pub fn table_view(&self) -> TableView<'_> {
        match self.cache.snapshot() {
            Some(snap) if !snap.entries.is_empty() => TableView::Rows(self.table.view(&snap.entries)),
            _ => TableView::Empty {
                title: NO_DATA_TITLE,
                hint: NO_DATA_HINT,
            },
        }
    }

    pub fn summary(&self) -> Option<SummaryView> {
        self.cache
            .snapshot()
            .and_then(|s| s.summary.as_ref())
            .map(summary_view)
    }

    pub fn last_update(&self) -> Option<&str> {
        self.cache
            .snapshot()
            .and_then(|s| s.last_update.as_deref())
    }

    /// Filter, search and sort state for the table.
    pub fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }

    // --- Notifications ---

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn dismiss_notification(&mut self, id: u64) {
        self.notifications.dismiss(id);
    }

    pub fn sweep_notifications(&mut self, now: Instant) {
        self.notifications.sweep(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ActivityStatus, Progress, RankingEntry, Stats};
    use crate::notify::NotificationLevel;
    use crate::status::Phase;
    use chrono::TimeZone;

    fn monitor() -> Monitor {
        Monitor::new(Duration::from_secs(5))
    }

    fn now_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
    }

    fn status(phase: Phase) -> PollerEvent {
        PollerEvent::Status(ActivityStatus {
            status: phase,
            current_operation: None,
            last_activity: None,
            progress: Progress::default(),
            stats: Stats::default(),
        })
    }

    fn payload(symbols: &[&str]) -> RankingPayload {
        RankingPayload {
            entries: symbols
                .iter()
                .enumerate()
                .map(|(i, s)| RankingEntry {
                    symbol: s.to_string(),
                    rank: i as u32 + 1,
                    pnl_percentage: 1.0,
                    total_pnl: 10.0,
                    win_rate: 60.0,
                    hours_tracked: 4,
                    avg_hourly_pnl: 2.5,
                    action: "🟢 BUY".to_string(),
                })
                .collect(),
            summary: None,
            last_update: Some("2026-08-26T12:00:00".to_string()),
        }
    }

    #[test]
    fn refresh_blocked_while_scan_in_progress() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Calculating), now_utc());

        let ticket = m.begin_refresh(Instant::now());
        assert!(ticket.is_none());
        assert!(!m.is_refreshing());

        let note = m.notifications().active().next().unwrap();
        assert_eq!(note.level, NotificationLevel::Warning);
        assert!(note.message.contains("busy"));
    }

    #[test]
    fn refresh_allowed_when_idle() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Idle), now_utc());

        let ticket = m.begin_refresh(Instant::now()).expect("ticket");
        assert!(m.is_refreshing());

        let outcome = m.apply_refresh(ticket, Ok(payload(&["BTCUSDT"])), Instant::now());
        assert_eq!(outcome, RefreshOutcome::Applied);
        assert!(!m.is_refreshing());
        assert!(matches!(m.table_view(), TableView::Rows(rows) if rows.len() == 1));
        assert_eq!(m.last_update(), Some("2026-08-26T12:00:00"));
    }

    #[test]
    fn stale_response_never_overwrites_newer_data() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Idle), now_utc());

        // Auto-refresh starts at t1, a manual click starts at t2.
        let t1 = m.begin_refresh(Instant::now()).unwrap();
        let t2 = m.begin_refresh(Instant::now()).unwrap();

        // t2 completes first; t1's slower response arrives afterwards.
        assert_eq!(
            m.apply_refresh(t2, Ok(payload(&["ETHUSDT"])), Instant::now()),
            RefreshOutcome::Applied
        );
        assert_eq!(
            m.apply_refresh(t1, Ok(payload(&["BTCUSDT"])), Instant::now()),
            RefreshOutcome::Stale
        );

        assert_eq!(m.snapshot().unwrap().entries[0].symbol, "ETHUSDT");
    }

    #[test]
    fn backend_error_keeps_cached_snapshot_and_surfaces_message() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Idle), now_utc());

        let t1 = m.begin_refresh(Instant::now()).unwrap();
        m.apply_refresh(t1, Ok(payload(&["BTCUSDT"])), Instant::now());

        let t2 = m.begin_refresh(Instant::now()).unwrap();
        let outcome = m.apply_refresh(
            t2,
            Err(ApiError::Backend("rate limited".to_string())),
            Instant::now(),
        );

        assert_eq!(outcome, RefreshOutcome::BackendError);
        // Previous snapshot still displayed.
        assert_eq!(m.snapshot().unwrap().entries[0].symbol, "BTCUSDT");
        let error_note = m
            .notifications()
            .active()
            .find(|n| n.level == NotificationLevel::Error)
            .unwrap();
        assert!(error_note.message.contains("rate limited"));
    }

    #[test]
    fn empty_data_is_a_placeholder_not_an_error() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Waiting), now_utc());

        let t = m.begin_refresh(Instant::now()).unwrap();
        let outcome = m.apply_refresh(t, Ok(payload(&[])), Instant::now());

        assert_eq!(outcome, RefreshOutcome::Applied);
        match m.table_view() {
            TableView::Empty { title, .. } => assert_eq!(title, "No data available"),
            TableView::Rows(_) => panic!("expected placeholder"),
        }
        // No error notification was posted.
        assert!(m
            .notifications()
            .active()
            .all(|n| n.level != NotificationLevel::Error));
    }

    #[test]
    fn connection_error_leaves_cached_table_intact() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Idle), now_utc());
        let t = m.begin_refresh(Instant::now()).unwrap();
        m.apply_refresh(t, Ok(payload(&["BTCUSDT"])), Instant::now());

        let frame = m.handle_poll(PollerEvent::ConnectionError, now_utc());
        assert_eq!(frame.descriptor.label, "Connection Error");
        assert!(matches!(m.table_view(), TableView::Rows(rows) if rows.len() == 1));
    }

    #[test]
    fn poller_and_refresh_do_not_corrupt_each_other() {
        let mut m = monitor();
        m.handle_poll(status(Phase::Idle), now_utc());
        let t = m.begin_refresh(Instant::now()).unwrap();

        // Status polls keep landing while the fetch is outstanding.
        m.handle_poll(status(Phase::Fetching), now_utc());
        m.handle_poll(status(Phase::Calculating), now_utc());

        let outcome = m.apply_refresh(t, Ok(payload(&["BTCUSDT"])), Instant::now());
        assert_eq!(outcome, RefreshOutcome::Applied);

        // A new refresh is now blocked by the busy phase, but the cache
        // kept the applied snapshot.
        assert!(m.begin_refresh(Instant::now()).is_none());
        assert_eq!(m.snapshot().unwrap().entries[0].symbol, "BTCUSDT");
    }
}
