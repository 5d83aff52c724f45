//! Cache Module
//!
//! Bounded in-memory response cache with FIFO eviction and promote-on-hit
//! ordering, shared between connection tasks.

mod entry;
mod order;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::{Handle, OrderList};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default cache capacity in body bytes
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1_049_000;

/// Default largest cacheable response body in bytes
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400;

/// Default largest cacheable response header block in bytes
pub const DEFAULT_MAX_HEADERS_SIZE: usize = 50_000;
