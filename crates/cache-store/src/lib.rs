//! Key/value cache stores with per-entry expiry
//!
//! The `CacheStore` trait is the seam the component token managers use for
//! the verify ticket, the component access token and pre-auth codes. Two
//! backends ship with the crate:
//!
//! - `MemoryCache`: process-local map, expiry on the tokio clock
//! - `FileCache`: JSON file with absolute unix expiry, atomic writes
//!
//! A store shared between several platform identities relies on callers to
//! namespace their keys. Writes are last-writer-wins.

pub mod error;
pub mod file;
pub mod memory;

pub use error::{Error, Result};
pub use file::FileCache;
pub use memory::MemoryCache;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by `CacheStore` methods.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Abstraction over a shared key/value cache.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn CacheStore>`).
pub trait CacheStore: Send + Sync {
    /// Look up a live entry. Expired entries read as `None`.
    fn fetch<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

    /// Store a value. `ttl` of `None` keeps the entry until overwritten or deleted.
    fn save<'a>(&'a self, key: &'a str, value: String, ttl: Option<Duration>)
    -> CacheFuture<'a, ()>;

    /// Remove an entry. Returns whether a live entry was removed.
    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;
}
