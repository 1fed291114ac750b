//! Backend phase reconciliation.
//!
//! Each poll of the activity endpoint is an independent snapshot, not a
//! delta: the backend may repeat a phase, skip phases, or step backward
//! (idle → error → idle). The [`Reconciler`] therefore derives every frame
//! from the latest snapshot alone, keeping only the minimal cross-frame
//! state needed for one-shot effects (symbol pulse, stat flash, the
//! scan-in-progress flag).

use crate::api::types::ActivityStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

/// Backend operation phase as reported by `/api/activity-status`.
///
/// `Unknown` absorbs any phase string a newer backend may emit, so the
/// render mapping stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Starting,
    Fetching,
    Calculating,
    Completed,
    Error,
    Waiting,
    #[serde(other)]
    #[default]
    Unknown,
}

impl Phase {
    /// True while the backend is running a scan. A ranking refresh issued
    /// during a busy phase is rejected with a warning instead of queued.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Starting | Phase::Fetching | Phase::Calculating)
    }

    pub const ALL: [Phase; 8] = [
        Phase::Idle,
        Phase::Starting,
        Phase::Fetching,
        Phase::Calculating,
        Phase::Completed,
        Phase::Error,
        Phase::Waiting,
        Phase::Unknown,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::Fetching => "fetching",
            Phase::Calculating => "calculating",
            Phase::Completed => "completed",
            Phase::Error => "error",
            Phase::Waiting => "waiting",
            Phase::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// How a phase renders: indicator icon, status label, color class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDescriptor {
    pub icon: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Total mapping from phase to render descriptor.
pub fn descriptor(phase: Phase) -> StatusDescriptor {
    match phase {
        Phase::Idle => StatusDescriptor {
            icon: "circle-fill",
            label: "System Ready",
            color: "success",
        },
        Phase::Starting => StatusDescriptor {
            icon: "play-circle",
            label: "Starting Calculation",
            color: "primary",
        },
        Phase::Fetching => StatusDescriptor {
            icon: "download",
            label: "Fetching Data",
            color: "info",
        },
        Phase::Calculating => StatusDescriptor {
            icon: "hourglass-split",
            label: "Calculating DCA Rankings",
            color: "warning",
        },
        Phase::Completed => StatusDescriptor {
            icon: "check-circle-fill",
            label: "Calculation Completed",
            color: "success",
        },
        Phase::Error => StatusDescriptor {
            icon: "exclamation-triangle-fill",
            label: "System Error",
            color: "danger",
        },
        Phase::Waiting => StatusDescriptor {
            icon: "clock",
            label: "Waiting for Data",
            color: "secondary",
        },
        Phase::Unknown => StatusDescriptor {
            icon: "question-circle",
            label: "Unknown Status",
            color: "muted",
        },
    }
}

/// Rendered when a status poll fails at the transport level. Cached ranking
/// data stays on screen; only the indicator flips.
pub const CONNECTION_ERROR: StatusDescriptor = StatusDescriptor {
    icon: "wifi-off",
    label: "Connection Error",
    color: "danger",
};

/// Progress bar color band, by backend-supplied percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    /// < 30%
    Low,
    /// 30–69%
    Mid,
    /// >= 70%
    High,
}

impl ProgressBand {
    pub fn from_percentage(pct: f64) -> Self {
        if pct < 30.0 {
            ProgressBand::Low
        } else if pct < 70.0 {
            ProgressBand::Mid
        } else {
            ProgressBand::High
        }
    }

    /// CSS gradient for the bar fill.
    pub fn gradient(&self) -> &'static str {
        match self {
            ProgressBand::Low => "linear-gradient(90deg, #dc3545, #fd7e14)",
            ProgressBand::Mid => "linear-gradient(90deg, #fd7e14, #ffc107)",
            ProgressBand::High => "linear-gradient(90deg, #28a745, #20c997)",
        }
    }
}

/// Stat counters the reconciler flashes on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    TotalRequests,
    SuccessfulCalculations,
    ApiCalls,
    Errors,
}

/// The counter values currently on screen. Flash detection is a pure
/// function of (displayed, incoming); no diff log is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsView {
    pub total_requests: u64,
    pub successful_calculations: u64,
    pub api_calls: u64,
    pub errors: u32,
}

/// Progress sub-view, present iff `progress.total > 0`.
///
/// `percentage` and its label come straight from the backend; the client
/// deliberately never recomputes them from `processed / total`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub percentage: f64,
    pub label: String,
    pub band: ProgressBand,
    pub processed: u32,
    pub total: u32,
    pub current_symbol: Option<String>,
    pub eta: String,
}

/// Why a scan stopped, for the one-shot end-of-scan effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    Completed,
    Failed,
}

/// One fully derived render frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFrame {
    pub phase: Phase,
    pub descriptor: StatusDescriptor,
    pub operation: String,
    pub uptime: String,
    pub last_activity: Option<String>,
    pub progress: Option<ProgressView>,
    pub stats: StatsView,
    /// Set only when `current_symbol` differs from the previously rendered
    /// value; drives a single visual pulse.
    pub pulse_symbol: Option<String>,
    /// Stat fields whose value changed since the last frame.
    pub flashed: Vec<StatField>,
    /// Set on the poll that ends a scan (completed or errored), once.
    pub scan_ended: Option<ScanEnd>,
}

const NO_OPERATION: &str = "No active operations";
const ETA_PENDING: &str = "Calculating...";

/// Translates activity snapshots into render frames.
pub struct Reconciler {
    last_symbol: Option<String>,
    displayed: StatsView,
    scan_in_progress: bool,
    last_phase: Option<Phase>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            last_symbol: None,
            displayed: StatsView::default(),
            scan_in_progress: false,
            last_phase: None,
        }
    }

    /// The most recently applied phase, if any poll has succeeded yet.
    pub fn phase(&self) -> Option<Phase> {
        self.last_phase
    }

    pub fn scan_in_progress(&self) -> bool {
        self.scan_in_progress
    }

    /// Derive the render frame for one status snapshot.
    pub fn apply(&mut self, status: &ActivityStatus, now: DateTime<Utc>) -> StatusFrame {
        let phase = status.status;
        self.last_phase = Some(phase);

        let scan_ended = self.update_scan_flag(phase);

        let progress = if status.progress.total > 0 {
            let symbol = status.progress.current_symbol.clone();
            Some(ProgressView {
                percentage: status.progress.percentage,
                label: format!("{}%", status.progress.percentage),
                band: ProgressBand::from_percentage(status.progress.percentage),
                processed: status.progress.processed,
                total: status.progress.total,
                current_symbol: symbol,
                eta: status
                    .progress
                    .eta
                    .clone()
                    .unwrap_or_else(|| ETA_PENDING.to_string()),
            })
        } else {
            None
        };

        // One-shot pulse: only when the symbol changes. A missing symbol
        // leaves the previously rendered value in place, so it does not
        // clear the memory either.
        let pulse_symbol = match &status.progress.current_symbol {
            Some(sym) if self.last_symbol.as_deref() != Some(sym.as_str()) => {
                self.last_symbol = Some(sym.clone());
                Some(sym.clone())
            }
            _ => None,
        };

        let incoming = StatsView {
            total_requests: status.stats.total_requests,
            successful_calculations: status.stats.successful_calculations,
            api_calls: status.stats.api_calls,
            errors: status.progress.errors,
        };
        let flashed = diff_stats(self.displayed, incoming);
        self.displayed = incoming;

        StatusFrame {
            phase,
            descriptor: descriptor(phase),
            operation: status
                .current_operation
                .clone()
                .unwrap_or_else(|| NO_OPERATION.to_string()),
            uptime: status.stats.uptime.clone(),
            last_activity: status
                .last_activity
                .as_deref()
                .and_then(|ts| humanize_last_activity(ts, now)),
            progress,
            stats: incoming,
            pulse_symbol,
            flashed,
            scan_ended,
        }
    }

    /// Frame for a failed poll: a synthetic connection-error indicator
    /// rather than silently leaving the previous status rendered.
    pub fn apply_connection_error(&mut self) -> StatusFrame {
        StatusFrame {
            phase: Phase::Unknown,
            descriptor: CONNECTION_ERROR,
            operation: "Unable to fetch activity status".to_string(),
            uptime: String::new(),
            last_activity: None,
            progress: None,
            stats: self.displayed,
            pulse_symbol: None,
            flashed: Vec::new(),
            scan_ended: None,
        }
    }

    fn update_scan_flag(&mut self, phase: Phase) -> Option<ScanEnd> {
        if phase.is_busy() {
            self.scan_in_progress = true;
            return None;
        }
        match phase {
            Phase::Completed if self.scan_in_progress => {
                self.scan_in_progress = false;
                info!("scan complete");
                Some(ScanEnd::Completed)
            }
            Phase::Error if self.scan_in_progress => {
                self.scan_in_progress = false;
                error!("scan failed");
                Some(ScanEnd::Failed)
            }
            _ => None,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

fn diff_stats(displayed: StatsView, incoming: StatsView) -> Vec<StatField> {
    let mut flashed = Vec::new();
    if incoming.total_requests != displayed.total_requests {
        flashed.push(StatField::TotalRequests);
    }
    if incoming.successful_calculations != displayed.successful_calculations {
        flashed.push(StatField::SuccessfulCalculations);
    }
    if incoming.api_calls != displayed.api_calls {
        flashed.push(StatField::ApiCalls);
    }
    if incoming.errors != displayed.errors {
        flashed.push(StatField::Errors);
    }
    flashed
}

/// "32s ago" / "5m ago" for recent activity, wall-clock time otherwise.
pub fn humanize_last_activity(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let diff_seconds = (now - parsed).num_seconds().max(0);
    let text = if diff_seconds < 60 {
        format!("{}s ago", diff_seconds)
    } else if diff_seconds < 3600 {
        format!("{}m ago", diff_seconds / 60)
    } else {
        parsed.format("%H:%M:%S").to_string()
    };
    Some(text)
}
