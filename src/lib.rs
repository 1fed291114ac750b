//! Client-side monitor for a DCA ranking backend.
//!
//! Polls the backend's activity endpoint, reconciles each status snapshot
//! into deterministic render state, caches wholesale-replaced ranking
//! snapshots with stale-response protection, and derives filtered/sorted
//! table views as pure functions of the cache.

pub mod api;
pub mod config;
pub mod detail;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod ranking;
pub mod status;
