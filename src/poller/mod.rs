//! Recurring activity-status poller.
//!
//! Runs on a tokio interval (default 2s) and forwards each snapshot to the
//! session over an unbounded channel. The fetch is awaited inside the tick
//! loop, so at most one request is ever in flight: on a slow network the
//! interval's missed ticks collapse instead of piling up concurrent
//! requests. A failed poll emits a synthetic connection-error event rather
//! than going silent.

use crate::api::{ActivityStatus, DcaBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Events from the poller.
#[derive(Debug)]
pub enum PollerEvent {
    Status(ActivityStatus),
    ConnectionError,
}

pub struct ActivityPoller {
    event_tx: mpsc::UnboundedSender<PollerEvent>,
}

/// Handle that stops the poll task when the view is torn down. Dropping the
/// handle also stops it.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl PollerHandle {
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl ActivityPoller {
    pub fn new(event_tx: mpsc::UnboundedSender<PollerEvent>) -> Self {
        Self { event_tx }
    }

    /// Spawn the poll loop. The first poll fires immediately, then every
    /// `period`.
    pub fn start(&self, backend: Arc<dyn DcaBackend>, period: Duration) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            run_poll_loop(backend, period, tx, shutdown_rx).await;
        });

        PollerHandle { shutdown_tx }
    }
}

async fn run_poll_loop(
    backend: Arc<dyn DcaBackend>,
    period: Duration,
    event_tx: mpsc::UnboundedSender<PollerEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period = ?period, "activity poller started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = match backend.activity_status().await {
                    Ok(status) => PollerEvent::Status(status),
                    Err(e) => {
                        warn!(error = %e, "activity status poll failed");
                        PollerEvent::ConnectionError
                    }
                };
                if event_tx.send(event).is_err() {
                    debug!("poller receiver dropped, stopping");
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("activity poller stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Progress, Stats};
    use crate::api::{ApiError, RankingPayload, SymbolDetail};
    use crate::status::Phase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowBackend {
        response_time: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        fail: bool,
    }

    impl SlowBackend {
        fn new(response_time: Duration, fail: bool) -> Self {
            Self {
                response_time,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl DcaBackend for SlowBackend {
        async fn activity_status(&self) -> Result<ActivityStatus, ApiError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(self.response_time).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(ApiError::Backend("unreachable".to_string()));
            }
            Ok(ActivityStatus {
                status: Phase::Idle,
                current_operation: None,
                last_activity: None,
                progress: Progress::default(),
                stats: Stats::default(),
            })
        }

        async fn ranking(&self) -> Result<RankingPayload, ApiError> {
            unimplemented!("not used by poller tests")
        }

        async fn symbol_detail(&self, _symbol: &str) -> Result<SymbolDetail, ApiError> {
            unimplemented!("not used by poller tests")
        }
    }

    #[tokio::test]
    async fn at_most_one_request_in_flight_on_slow_network() {
        // Round trip (30ms) far exceeds the poll period (5ms).
        let backend = Arc::new(SlowBackend::new(Duration::from_millis(30), false));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = ActivityPoller::new(tx);
        let handle = poller.start(backend.clone(), Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.stop();

        assert!(backend.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(matches!(rx.try_recv(), Ok(PollerEvent::Status(_))));
    }

    #[tokio::test]
    async fn failed_poll_emits_connection_error() {
        let backend = Arc::new(SlowBackend::new(Duration::from_millis(1), true));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = ActivityPoller::new(tx);
        let handle = poller.start(backend, Duration::from_millis(5));

        let event = rx.recv().await.expect("poller event");
        handle.stop();
        assert!(matches!(event, PollerEvent::ConnectionError));
    }

    #[tokio::test]
    async fn stop_halts_polling() {
        let backend = Arc::new(SlowBackend::new(Duration::from_millis(1), false));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = ActivityPoller::new(tx);
        let handle = poller.start(backend.clone(), Duration::from_millis(5));

        let _ = rx.recv().await;
        handle.stop();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let calls_after_stop = backend.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls_after_stop);
    }
}
