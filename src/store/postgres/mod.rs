use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use crate::Id;
use crate::store::{Error, MAX_TTL_SECS, RecordStore};

/// A Postgres-backed record store.
///
/// Each session table has the layout
///
/// | Column     | Type                    | Description                          |
/// |------------|-------------------------|--------------------------------------|
/// | id         | TEXT (Primary Key)      | Session ID                           |
/// | data       | TEXT                    | Encoded session values               |
/// | expires_at | TIMESTAMPTZ             | When the record stops being readable |
///
/// Expired rows are never returned. They stay on disk until
/// [`PostgresStore::delete_expired`] is run, which the application may
/// schedule however it sees fit.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes every expired row from `table`, returning how many were deleted.
    pub async fn delete_expired(&self, table: &str) -> Result<u64, Error> {
        let query = format!(r#"delete from "{table}" where expires_at < now()"#);
        let result = sqlx::query(&query).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

impl RecordStore for PostgresStore {
    async fn ensure_schema(&self, table: &str) -> Result<(), Error> {
        sqlx::raw_sql(&format!(
            r#"
            create table if not exists "{table}" (
                id text primary key,
                data text not null,
                expires_at timestamptz not null
            );
            create index if not exists "idx_{table}_expires_at" on "{table}"(expires_at);
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, table: &str, id: &Id) -> Result<Option<String>, Error> {
        let query = format!(
            r#"select data from "{table}" where id = $1 and expires_at > now()"#
        );
        let data: Option<String> = sqlx::query_scalar(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(data)
    }

    async fn put(&self, table: &str, id: &Id, payload: &str, ttl_secs: i64) -> Result<(), Error> {
        if ttl_secs <= 0 {
            return Err(Error::InvalidTtl(ttl_secs));
        }

        let expires_at = OffsetDateTime::now_utc()
            .checked_add(Duration::seconds(ttl_secs.min(MAX_TTL_SECS)))
            .ok_or(Error::InvalidTtl(ttl_secs))?;
        let query = format!(
            r#"
            insert into "{table}" (id, data, expires_at)
            values ($1, $2, $3)
            on conflict (id) do update
            set data = excluded.data, expires_at = excluded.expires_at
            "#
        );
        sqlx::query(&query)
            .bind(id.to_string())
            .bind(payload)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, table: &str, id: &Id) -> Result<(), Error> {
        let query = format!(r#"delete from "{table}" where id = $1"#);
        sqlx::query(&query)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
