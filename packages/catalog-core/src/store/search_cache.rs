//! Search result cache repository (§4.9, §6.4): a persistent fallback for
//! the in-process LRU in [`crate::lru`] so restarts don't cold-start
//! every orchestrated search.

use chrono::NaiveDateTime;
use sqlx::PgPool;

use super::columns::SEARCH_CACHE_COLUMNS;
use crate::models::SearchCacheEntry;

#[derive(Clone)]
pub struct SearchCacheRepository {
    pool: PgPool,
}

impl SearchCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, cache_key: &str) -> Result<Option<SearchCacheEntry>, sqlx::Error> {
        let sql = format!("SELECT {SEARCH_CACHE_COLUMNS} FROM search_cache WHERE cache_key = $1");
        sqlx::query_as::<_, SearchCacheEntry>(&sql)
            .bind(cache_key)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn put(
        &self,
        cache_key: &str,
        payload: &serde_json::Value,
        context: Option<&str>,
    ) -> Result<SearchCacheEntry, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO search_cache (cache_key, payload, created_at, updated_at, context)
            VALUES ($1, $2, now(), now(), $3)
            ON CONFLICT (cache_key) DO UPDATE SET
                payload = EXCLUDED.payload, updated_at = now(), context = EXCLUDED.context
            RETURNING {SEARCH_CACHE_COLUMNS}"#
        );
        sqlx::query_as::<_, SearchCacheEntry>(&sql)
            .bind(cache_key)
            .bind(payload)
            .bind(context)
            .fetch_one(&self.pool)
            .await
    }

    /// Deletes entries older than `updated_at` cutoff, keyed by `context`
    /// prefix (e.g. invalidating one curated list at a time, §4.10).
    pub async fn invalidate_by_context(&self, context: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM search_cache WHERE context = $1")
            .bind(context)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn prune_older_than(&self, cutoff: NaiveDateTime) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM search_cache WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
