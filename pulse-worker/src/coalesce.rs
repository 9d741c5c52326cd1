//! Single-flight coalescing of cold refreshes.
//!
//! When several readers miss the cache for the same group at once, only the
//! first one (the leader) refreshes. The others subscribe to the leader's
//! broadcast channel and re-read the cache once it reports completion.
//!
//! ```text
//! reader A ─┐
//! reader B ─┼──► RefreshCoalescer ──► leader refreshes group
//! reader C ─┘         │                       │
//!                     ▼                       ▼
//!              B, C wait on channel ◄── complete(ok)
//! ```
//!
//! If the leader is cancelled before completing, its guard drops the entry
//! and the sender; followers observe a closed channel and join again, so one
//! of them takes over the refresh.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use pulse_core::RefreshGroup;

/// Tracks which refresh groups have a cold refresh in flight.
#[derive(Debug, Default)]
pub struct RefreshCoalescer {
    in_flight: DashMap<RefreshGroup, broadcast::Sender<bool>>,
    leaders: AtomicU64,
    followers: AtomicU64,
}

/// Counters for coalescing effectiveness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Joins that started a refresh
    pub leaders: u64,
    /// Joins that waited on an in-flight refresh
    pub followers: u64,
}

impl CoalescerStats {
    /// Fraction of joins that were coalesced (0.0 to 1.0).
    pub fn coalescing_ratio(&self) -> f64 {
        let total = self.leaders + self.followers;
        if total == 0 {
            0.0
        } else {
            self.followers as f64 / total as f64
        }
    }
}

/// Role assigned by [`RefreshCoalescer::join`].
pub enum Flight<'a> {
    /// No refresh in flight: the caller must refresh, then `complete`.
    Leader(FlightGuard<'a>),
    /// A refresh is in flight: wait on the receiver, then re-read.
    Follower(broadcast::Receiver<bool>),
}

/// Held by the leader for the duration of its refresh.
pub struct FlightGuard<'a> {
    coalescer: &'a RefreshCoalescer,
    group: RefreshGroup,
    completed: bool,
}

impl FlightGuard<'_> {
    pub fn group(&self) -> RefreshGroup {
        self.group
    }

    /// Release waiting followers, reporting whether anything was written.
    pub fn complete(mut self, ok: bool) {
        self.completed = true;
        if let Some((_, tx)) = self.coalescer.in_flight.remove(&self.group) {
            // No receivers is fine: nobody joined.
            let _ = tx.send(ok);
        }
        debug!(group = %self.group, ok, "Cold refresh completed");
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.coalescer.in_flight.remove(&self.group);
            debug!(group = %self.group, "Cold refresh abandoned");
        }
    }
}

impl RefreshCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `group`, becoming leader if none is in flight.
    pub fn join(&self, group: RefreshGroup) -> Flight<'_> {
        match self.in_flight.entry(group) {
            Entry::Occupied(entry) => {
                let rx = entry.get().subscribe();
                self.followers.fetch_add(1, Ordering::Relaxed);
                debug!(group = %group, "Waiting on in-flight refresh");
                Flight::Follower(rx)
            }
            Entry::Vacant(entry) => {
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx);
                self.leaders.fetch_add(1, Ordering::Relaxed);
                Flight::Leader(FlightGuard {
                    coalescer: self,
                    group,
                    completed: false,
                })
            }
        }
    }

    /// Whether a refresh for `group` is in flight.
    pub fn is_in_flight(&self, group: RefreshGroup) -> bool {
        self.in_flight.contains_key(&group)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            leaders: self.leaders.load(Ordering::Relaxed),
            followers: self.followers.load(Ordering::Relaxed),
        }
    }
}
