//! The record store boundary: where encoded session payloads are persisted.

use std::future::Future;

use crate::Id;

pub mod memory;

#[cfg(feature = "postgres-store")]
pub mod postgres;

#[cfg(feature = "redis-store")]
pub mod redis;

pub use memory::MemoryStore;

/// Longest lifetime, in seconds, a record is actually kept for. Larger TTLs
/// are clamped to it.
pub const MAX_TTL_SECS: i64 = 60 * 60 * 24 * 365 * 100;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("records must expire in the future, got a ttl of {0}s")]
    InvalidTtl(i64),

    /// The backend failed; the driver's error is kept as the source.
    #[error("{0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "postgres-store")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

#[cfg(feature = "redis-store")]
impl From<fred::error::Error> for Error {
    fn from(err: fred::error::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// A key/value backend holding one encoded payload per session.
///
/// `table` is always a name made of ASCII letters, digits and underscores;
/// the [`SessionStore`](crate::SessionStore) validates it before it reaches
/// an implementation, so it may be interpolated into query text.
pub trait RecordStore: Send + Sync + 'static {
    /// Creates the structure backing `table` if it does not exist yet.
    ///
    /// Must be safe to call repeatedly.
    fn ensure_schema(&self, table: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Gets the payload stored at `id`.
    ///
    /// Returns `None` when there is no record or when its TTL has elapsed.
    fn get(
        &self,
        table: &str,
        id: &Id,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    /// Inserts or fully replaces the payload stored at `id`, expiring it after
    /// `ttl_secs` seconds.
    ///
    /// A `ttl_secs` of `0` or less is rejected with [`Error::InvalidTtl`];
    /// anything above [`MAX_TTL_SECS`] is clamped to it.
    fn put(
        &self,
        table: &str,
        id: &Id,
        payload: &str,
        ttl_secs: i64,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes the record stored at `id`. Deleting a missing record is not an error.
    fn delete(&self, table: &str, id: &Id) -> impl Future<Output = Result<(), Error>> + Send;
}
