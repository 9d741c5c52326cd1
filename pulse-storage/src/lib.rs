//! Pulse Storage - Cache Layer
//!
//! The cache store is the only shared mutable state of the refresh engine.
//! The scheduler-driven refresh writes it; request handlers read it.
//!
//! # Staleness
//!
//! TTLs are advisory. An expired entry is still returned by
//! [`CacheStore::get`]; typed reads wrap values in [`CacheRead<T>`] so callers
//! can see how old they are. Nothing is ever evicted: a failed refresh leaves
//! the previous value in place, and only a successful write replaces it.
//!
//! # Example
//!
//! ```ignore
//! let store = InMemoryCacheStore::new();
//! store.set(CacheKey::Snapshot(category, region), snapshot.into(), ttl);
//!
//! if let Some(read) = store.get_snapshot(category, region) {
//!     if read.is_expired() {
//!         tracing::debug!(age_secs = read.staleness().as_secs(), "serving stale snapshot");
//!     }
//! }
//! ```

pub mod entry;
pub mod freshness;
pub mod memory;
pub mod traits;

pub use entry::{CacheEntry, CacheValue};
pub use freshness::CacheRead;
pub use memory::InMemoryCacheStore;
pub use traits::{CacheStats, CacheStore};
