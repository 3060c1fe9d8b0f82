//! TTLSTORE - Thread-Safe In-Process Key-Value Store
//!
//! Every entry carries an expiration deadline. Expired entries are hidden
//! from reads immediately and reclaimed lazily, either when overwritten or
//! deleted, or by an optional background sweep.
//!
//! ```
//! use std::time::Duration;
//! use ttlstore::Store;
//!
//! let store = Store::new();
//! store.set("session", "abc", Duration::from_secs(30));
//! store.set("config", "xyz", Duration::ZERO); // no expiration
//!
//! assert_eq!(store.get("session"), Some("abc"));
//! store.delete("session");
//! assert_eq!(store.get("session"), None);
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use storage::{CleanerHandle, ConcurrentStore, Expiration, Store, Sweep, TtlCleaner};
