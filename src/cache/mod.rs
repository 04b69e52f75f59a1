//! Session-scoped response caching.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Stores JSON values with a write timestamp under normalized keys
//! - Expires entries after a fixed TTL, purging them on read
//! - Treats every storage failure as a miss or a skipped write

mod key;
mod layer;
mod storage;
mod traits;

pub use key::CacheKey;
pub use layer::{CacheLayer, DEFAULT_TTL_MINUTES};
pub use storage::{CacheStorage, MemoryStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
