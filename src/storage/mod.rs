//! Storage Engine
//!
//! In-memory key-value stores with per-entry expiration.

mod concurrent_store;
mod entry;
mod store;
mod ttl;

pub use concurrent_store::ConcurrentStore;
pub use entry::Expiration;
pub use store::Store;
pub use ttl::{CleanerHandle, Sweep, TtlCleaner};
