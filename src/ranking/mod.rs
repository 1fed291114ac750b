//! Ranking snapshot cache.
//!
//! Snapshots are replaced wholesale: no incremental merge, no per-entry
//! bookkeeping. Concurrent fetches (a manual refresh racing the 5-minute
//! timer) are tagged with monotonically increasing sequence numbers at
//! start and applied in completion order; a slow response whose sequence
//! is below the last applied one is discarded so stale data can never
//! overwrite newer data, regardless of network reordering.

pub mod view;

use crate::api::types::{RankingEntry, RankingSummary};
use crate::api::RankingPayload;
use tracing::debug;

/// The most recent ranking data, owned by the session.
#[derive(Debug, Clone)]
pub struct RankingSnapshot {
    pub entries: Vec<RankingEntry>,
    pub summary: Option<RankingSummary>,
    pub last_update: Option<String>,
}

/// Sequence tag handed out when a fetch starts. Consumed when the result
/// is applied, so a ticket cannot be applied twice.
#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

pub struct RankingCache {
    snapshot: Option<RankingSnapshot>,
    next_seq: u64,
    last_applied: u64,
}

impl RankingCache {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            next_seq: 1,
            last_applied: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&RankingSnapshot> {
        self.snapshot.as_ref()
    }

    /// Tag the start of a fetch.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        FetchTicket { seq }
    }

    /// Apply a completed fetch. Returns false when the response is stale
    /// (a later-started fetch already applied); the cache is untouched.
    pub fn apply(&mut self, ticket: FetchTicket, payload: RankingPayload) -> bool {
        if ticket.seq <= self.last_applied {
            debug!(
                seq = ticket.seq,
                last_applied = self.last_applied,
                "discarding stale ranking response"
            );
            return false;
        }
        self.last_applied = ticket.seq;
        self.snapshot = Some(RankingSnapshot {
            entries: payload.entries,
            summary: payload.summary,
            last_update: payload.last_update,
        });
        true
    }
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new()
    }
}
