//! Track repository (§3, §4.1, §4.4 protected-deletion check).

use sqlx::PgPool;
use tracing::warn;

use super::columns::{escape_ilike, prefix_columns, ALIAS_MIN_SIMILARITY, TRACK_COLUMNS};
use crate::models::Track;

#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = $1");
        sqlx::query_as::<_, Track>(&sql).bind(id).fetch_optional(&self.pool).await
    }

    pub async fn find_by_provider_id(&self, provider_id: &str) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE provider_id = $1");
        sqlx::query_as::<_, Track>(&sql)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_album_id(&self, album_id: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE album_id = $1 ORDER BY id");
        sqlx::query_as::<_, Track>(&sql)
            .bind(album_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_artist_id(&self, artist_id: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE artist_id = $1 ORDER BY popularity DESC");
        sqlx::query_as::<_, Track>(&sql)
            .bind(artist_id)
            .fetch_all(&self.pool)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        provider_id: Option<&str>,
        name: &str,
        artist_id: i64,
        album_id: Option<i64>,
        duration_ms: i64,
        popularity: i32,
        preview_url: Option<&str>,
        external_url: Option<&str>,
    ) -> Result<Track, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO tracks
                (provider_id, name, artist_id, album_id, duration_ms, popularity,
                 preview_url, external_url, download_path,
                 created_at, updated_at, last_refreshed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, now(), now(), now())
            RETURNING {TRACK_COLUMNS}"#
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(provider_id)
            .bind(name)
            .bind(artist_id)
            .bind(album_id)
            .bind(duration_ms)
            .bind(popularity)
            .bind(preview_url)
            .bind(external_url)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_enrichment(
        &self,
        id: i64,
        popularity: i32,
        preview_url: Option<&str>,
        external_url: Option<&str>,
    ) -> Result<Track, sqlx::Error> {
        let sql = format!(
            r#"UPDATE tracks SET
                popularity = $2, preview_url = $3, external_url = $4,
                updated_at = now(), last_refreshed_at = now()
            WHERE id = $1
            RETURNING {TRACK_COLUMNS}"#
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(id)
            .bind(popularity)
            .bind(preview_url)
            .bind(external_url)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn set_download_path(&self, id: i64, download_path: Option<&str>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tracks SET download_path = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(download_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_provider_id(&self, id: i64, provider_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tracks SET provider_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Tracks whose name loosely matches `query`, for local-first search
    /// resolution (§4.9) before any external fanout is attempted.
    pub async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let escaped = escape_ilike(query);
        let sql = format!(
            r#"SELECT {TRACK_COLUMNS} FROM tracks
            WHERE name ILIKE $1
            ORDER BY CASE WHEN name ILIKE $2 THEN 0 ELSE 1 END, popularity DESC
            LIMIT $3"#
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(format!("%{escaped}%"))
            .bind(format!("{escaped}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Tracks joined through their aliases, for fuzzy/typo local lookups
    /// (§4.1, §4.3, §4.9). Same `pg_trgm`-with-ILIKE-fallback shape as
    /// `ArtistRepository::search_by_alias`.
    pub async fn search_by_alias(&self, normalized_query: &str, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        if normalized_query.is_empty() {
            return Ok(Vec::new());
        }
        let cols = prefix_columns(TRACK_COLUMNS, "t");
        let trgm_sql = format!(
            r#"SELECT DISTINCT {cols} FROM tracks t
            JOIN aliases al ON al.entity_kind = 'track' AND al.entity_id = t.id
            WHERE al.normalized_alias % $1 AND similarity(al.normalized_alias, $1) >= $2
            ORDER BY similarity(al.normalized_alias, $1) DESC, t.popularity DESC
            LIMIT $3"#
        );
        match sqlx::query_as::<_, Track>(&trgm_sql)
            .bind(normalized_query)
            .bind(ALIAS_MIN_SIMILARITY)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => Ok(rows),
            Err(err) => {
                warn!(error = %err, "alias trigram similarity query failed, falling back to substring match");
                let escaped = escape_ilike(normalized_query);
                let fallback_sql = format!(
                    r#"SELECT DISTINCT {cols} FROM tracks t
                    JOIN aliases al ON al.entity_kind = 'track' AND al.entity_id = t.id
                    WHERE al.normalized_alias ILIKE $1
                    ORDER BY t.popularity DESC
                    LIMIT $2"#
                );
                sqlx::query_as::<_, Track>(&fallback_sql)
                    .bind(format!("%{escaped}%"))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    /// Tracks on an album whose name matches, for the Catalog Writer's
    /// provider-id-miss fallback (§4.4).
    pub async fn find_by_album_and_name(&self, album_id: i64, name: &str) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE album_id = $1 AND name = $2");
        sqlx::query_as::<_, Track>(&sql)
            .bind(album_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// Tracks with a local download, most recently touched first
    /// (`downloaded`, §4.10).
    pub async fn find_downloaded(&self, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TRACK_COLUMNS} FROM tracks
            WHERE download_path IS NOT NULL
            ORDER BY updated_at DESC
            LIMIT $1"#
        );
        sqlx::query_as::<_, Track>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Most recently catalogued tracks, for the `discovery` list (§4.10).
    pub async fn find_recently_added(&self, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TRACK_COLUMNS} FROM tracks
            ORDER BY created_at DESC
            LIMIT $1"#
        );
        sqlx::query_as::<_, Track>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Tracks whose album released in `year`, ranked by popularity
    /// (`top-year`, §4.10).
    pub async fn find_top_by_release_year(&self, year: i32, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {cols} FROM tracks t
            JOIN albums a ON a.id = t.album_id
            WHERE a.release_date LIKE $1
            ORDER BY t.popularity DESC
            LIMIT $2"#,
            cols = TRACK_COLUMNS
                .trim()
                .split(',')
                .map(|c| format!("t.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(format!("{year}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Downloaded tracks ranked by provider popularity, a proxy for listen
    /// counts this crate never tracks directly (`most-played`, §4.10; play
    /// history lives in the out-of-scope local player, §1).
    pub async fn find_most_popular_downloaded(&self, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TRACK_COLUMNS} FROM tracks
            WHERE download_path IS NOT NULL
            ORDER BY popularity DESC
            LIMIT $1"#
        );
        sqlx::query_as::<_, Track>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    pub async fn find_stale(&self, max_age_hours: i64, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TRACK_COLUMNS} FROM tracks
            WHERE last_refreshed_at IS NULL OR last_refreshed_at < now() - ($1 || ' hours')::interval
            ORDER BY last_refreshed_at ASC NULLS FIRST
            LIMIT $2"#
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(max_age_hours)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Tracks with no `youtube_links` row at all, popularity-ranked, for
    /// the prefetch loop's first pass before it falls back to re-attempting
    /// rows already tracked as unresolved (§4.8).
    pub async fn find_missing_youtube_link(&self, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT t.{cols} FROM tracks t
            LEFT JOIN youtube_links y ON y.track_provider_id = t.provider_id
            WHERE t.provider_id IS NOT NULL AND y.track_provider_id IS NULL
            ORDER BY t.popularity DESC
            LIMIT $1"#,
            cols = TRACK_COLUMNS.trim().split(',').map(|c| c.trim()).collect::<Vec<_>>().join(", t.")
        );
        sqlx::query_as::<_, Track>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Whether any user's favorites reference this track, used to block
    /// deletion (§4.4 protected-deletion invariant).
    pub async fn is_favorited(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE entity_kind = 'track' AND entity_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
