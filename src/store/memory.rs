use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::Id;
use crate::store::{Error, MAX_TTL_SECS, RecordStore};

#[derive(Debug, Clone)]
struct StoredRecord {
    data: String,
    expires_at: Instant,
}

/// An in-memory record store.
///
/// Clones share the same data, which makes it convenient to keep a handle
/// for inspection while a [`SessionStore`](crate::SessionStore) owns another.
///
/// ### Note
///
/// Do not use this in a production environment.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<DashSet<String>>,
    records: Arc<DashMap<(String, Id), StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if [`RecordStore::ensure_schema`] created `table`.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Number of live (unexpired) records across all tables.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records
            .iter()
            .filter(|record| record.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_table(&self, table: &str) -> Result<(), Error> {
        if self.tables.contains(table) {
            Ok(())
        } else {
            Err(Error::Backend(format!("table {table} does not exist").into()))
        }
    }
}

impl RecordStore for MemoryStore {
    async fn ensure_schema(&self, table: &str) -> Result<(), Error> {
        self.tables.insert(table.to_owned());
        Ok(())
    }

    async fn get(&self, table: &str, id: &Id) -> Result<Option<String>, Error> {
        self.check_table(table)?;
        let key = (table.to_owned(), *id);

        if let Some(record) = self.records.get(&key) {
            if record.expires_at > Instant::now() {
                return Ok(Some(record.data.clone()));
            }
        }

        self.records
            .remove_if(&key, |_, record| record.expires_at <= Instant::now());
        Ok(None)
    }

    async fn put(&self, table: &str, id: &Id, payload: &str, ttl_secs: i64) -> Result<(), Error> {
        if ttl_secs <= 0 {
            return Err(Error::InvalidTtl(ttl_secs));
        }
        self.check_table(table)?;

        let ttl = Duration::from_secs(ttl_secs.min(MAX_TTL_SECS) as u64);
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or(Error::InvalidTtl(ttl_secs))?;

        self.records.insert(
            (table.to_owned(), *id),
            StoredRecord {
                data: payload.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, table: &str, id: &Id) -> Result<(), Error> {
        self.check_table(table)?;
        self.records.remove(&(table.to_owned(), *id));
        Ok(())
    }
}
