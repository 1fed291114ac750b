use dca_watch::api::{ApiClient, DcaBackend};
use dca_watch::config::Config;
use dca_watch::monitor::{Monitor, RefreshOutcome, TableView};
use dca_watch::poller::{ActivityPoller, PollerEvent};
use dca_watch::ranking::view::{classify_action, rank_highlight};
use dca_watch::status::Phase;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = if Path::new("dca-watch.toml").exists() {
        Config::load(Path::new("dca-watch.toml"))?
    } else {
        info!("no dca-watch.toml found, using env-only config");
        Config::from_env()
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("dca-watch v{} starting", env!("CARGO_PKG_VERSION"));
    info!(base_url = %config.api.base_url, "DCA ranking backend");

    let backend: Arc<dyn DcaBackend> = Arc::new(ApiClient::new(config.api.base_url.clone()));
    let mut monitor = Monitor::new(Duration::from_secs(config.notifications.ttl_secs));

    // --- Activity Poller ---
    let (poll_tx, mut poll_rx) = mpsc::unbounded_channel::<PollerEvent>();
    let poller = ActivityPoller::new(poll_tx);
    let poller_handle = poller.start(
        backend.clone(),
        Duration::from_millis(config.poller.status_interval_ms),
    );

    // --- Ranking refresh plumbing ---
    // Fetches run as spawned tasks and report back here; the session
    // applies results in completion order and discards stale ones.
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel();
    let mut refresh_interval =
        tokio::time::interval(Duration::from_secs(config.poller.ranking_refresh_secs));

    // Notification sweep cadence.
    let mut sweep_interval = tokio::time::interval(Duration::from_secs(1));

    let mut last_logged_phase: Option<Phase> = None;

    info!("entering main event loop - press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(event) = poll_rx.recv() => {
                let frame = monitor.handle_poll(event, chrono::Utc::now());

                if last_logged_phase != Some(frame.phase) {
                    info!(
                        phase = %frame.phase,
                        status = frame.descriptor.label,
                        operation = %frame.operation,
                        "backend status"
                    );
                    last_logged_phase = Some(frame.phase);
                }

                if let Some(ref progress) = frame.progress {
                    debug!(
                        pct = %progress.label,
                        processed = progress.processed,
                        total = progress.total,
                        symbol = ?progress.current_symbol,
                        eta = %progress.eta,
                        "scan progress"
                    );
                }
                if let Some(ref symbol) = frame.pulse_symbol {
                    debug!(symbol = %symbol, "processing symbol");
                }
            }

            _ = refresh_interval.tick() => {
                if let Some(ticket) = monitor.begin_refresh(Instant::now()) {
                    let backend = backend.clone();
                    let tx = refresh_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.ranking().await;
                        let _ = tx.send((ticket, result));
                    });
                } else {
                    warn!("skipping auto-refresh while backend is busy");
                }
            }

            Some((ticket, result)) = refresh_rx.recv() => {
                let outcome = monitor.apply_refresh(ticket, result, Instant::now());
                if outcome == RefreshOutcome::Applied {
                    log_snapshot(&monitor);
                }
            }

            _ = sweep_interval.tick() => {
                monitor.sweep_notifications(Instant::now());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down...");
                poller_handle.stop();
                break;
            }
        }
    }

    Ok(())
}

/// Log the freshly applied snapshot: summary widgets plus the top rows of
/// the current table view.
fn log_snapshot(monitor: &Monitor) {
    if let Some(summary) = monitor.summary() {
        info!(
            hours = summary.hours_tracked,
            invested = %summary.total_invested,
            value = %summary.total_value,
            pnl = %summary.total_pnl,
            avg_pnl = %summary.avg_pnl,
            profitable = %summary.profitable_rate,
            "ranking summary"
        );
    }

    match monitor.table_view() {
        TableView::Empty { title, hint } => {
            info!(hint = hint, "{}", title);
        }
        TableView::Rows(rows) => {
            info!("--- DCA Ranking (top {}) ---", rows.len().min(10));
            for entry in rows.iter().take(10) {
                info!(
                    rank = entry.rank,
                    top3 = rank_highlight(entry.rank).is_some(),
                    symbol = %entry.symbol,
                    pnl_pct = entry.pnl_percentage,
                    win_rate = entry.win_rate,
                    class = ?classify_action(&entry.action),
                    action = %entry.action,
                    "entry"
                );
            }
        }
    }

    if let Some(ts) = monitor.last_update() {
        info!(last_update = ts, "snapshot applied");
    }
}
