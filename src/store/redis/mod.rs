use crate::Id;
use crate::store::{Error, MAX_TTL_SECS, RecordStore};
use fred::clients::Pool;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::{fmt::Debug, sync::Arc};

/// A redis record store implementation.
///
/// Each record is a plain string key, `<table>:<session id>`, written with
/// `SET ... EX` so that Redis itself enforces the TTL. There is no schema to
/// provision, so [`RecordStore::ensure_schema`] does nothing.
#[derive(Clone, Debug)]
pub struct RedisStore<C: KeysInterface + Clone + Send + Sync = Pool> {
    client: Arc<C>,
}

impl<C> RedisStore<C>
where
    C: KeysInterface + Clone + Send + Sync,
{
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

fn key(table: &str, id: &Id) -> String {
    format!("{table}:{id}")
}

impl<C> RecordStore for RedisStore<C>
where
    C: KeysInterface + Clone + Send + Sync + 'static,
{
    async fn ensure_schema(&self, table: &str) -> Result<(), Error> {
        tracing::debug!(table, "redis keyspace needs no provisioning");
        Ok(())
    }

    async fn get(&self, table: &str, id: &Id) -> Result<Option<String>, Error> {
        Ok(self
            .client
            .get::<Option<String>, _>(key(table, id))
            .await?)
    }

    async fn put(&self, table: &str, id: &Id, payload: &str, ttl_secs: i64) -> Result<(), Error> {
        if ttl_secs <= 0 {
            return Err(Error::InvalidTtl(ttl_secs));
        }

        let _: () = self
            .client
            .set(
                key(table, id),
                payload,
                Some(Expiration::EX(ttl_secs.min(MAX_TTL_SECS))),
                None,
                false,
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: &Id) -> Result<(), Error> {
        let _: i64 = self.client.del(key(table, id)).await?;
        Ok(())
    }
}
