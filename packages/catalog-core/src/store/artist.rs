//! Artist repository (§3, §4.1).

use sqlx::PgPool;
use tracing::warn;

use super::columns::{escape_ilike, prefix_columns, ALIAS_MIN_SIMILARITY, ARTIST_COLUMNS};
use crate::models::Artist;

#[derive(Clone)]
pub struct ArtistRepository {
    pool: PgPool,
}

impl ArtistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Artist>, sqlx::Error> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = $1");
        sqlx::query_as::<_, Artist>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Looked up by the upstream provider's id (Spotify artist id), the
    /// stable join key between a provider response and a local row (§3).
    pub async fn find_by_provider_id(&self, provider_id: &str) -> Result<Option<Artist>, sqlx::Error> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE provider_id = $1");
        sqlx::query_as::<_, Artist>(&sql)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_normalized_name(&self, normalized_name: &str) -> Result<Vec<Artist>, sqlx::Error> {
        let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE normalized_name = $1");
        sqlx::query_as::<_, Artist>(&sql)
            .bind(normalized_name)
            .fetch_all(&self.pool)
            .await
    }

    /// Artists whose name or normalized_name loosely match `query`. This is
    /// a cheap pre-filter; final confidence scoring happens in `text::is_confident_match`
    /// against the full alias set (§4.3).
    pub async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<Artist>, sqlx::Error> {
        let escaped = escape_ilike(query);
        let sql = format!(
            r#"SELECT {ARTIST_COLUMNS} FROM artists
            WHERE name ILIKE $1 OR normalized_name ILIKE $1
            ORDER BY CASE WHEN name ILIKE $2 THEN 0 ELSE 1 END, popularity DESC
            LIMIT $3"#
        );
        sqlx::query_as::<_, Artist>(&sql)
            .bind(format!("%{escaped}%"))
            .bind(format!("{escaped}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Artists joined through their aliases, for fuzzy/typo lookups (§4.1,
    /// §4.3). Ranks by `pg_trgm` similarity so a near-miss query (e.g. a
    /// transposed letter) still surfaces a candidate even when no
    /// pre-generated alias variant matches it exactly; falls back to a
    /// plain substring match, with the degraded confidence left to the
    /// caller's own `text::is_confident_match` pass, if `pg_trgm` isn't
    /// installed (`app/api/search.py::_alias_score_map`).
    pub async fn search_by_alias(&self, normalized_query: &str, limit: i64) -> Result<Vec<Artist>, sqlx::Error> {
        if normalized_query.is_empty() {
            return Ok(Vec::new());
        }
        let cols = prefix_columns(ARTIST_COLUMNS, "a");
        let trgm_sql = format!(
            r#"SELECT DISTINCT {cols} FROM artists a
            JOIN aliases al ON al.entity_kind = 'artist' AND al.entity_id = a.id
            WHERE al.normalized_alias % $1 AND similarity(al.normalized_alias, $1) >= $2
            ORDER BY similarity(al.normalized_alias, $1) DESC, a.popularity DESC
            LIMIT $3"#
        );
        match sqlx::query_as::<_, Artist>(&trgm_sql)
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
                    r#"SELECT DISTINCT {cols} FROM artists a
                    JOIN aliases al ON al.entity_kind = 'artist' AND al.entity_id = a.id
                    WHERE al.normalized_alias ILIKE $1
                    ORDER BY a.popularity DESC
                    LIMIT $2"#
                );
                sqlx::query_as::<_, Artist>(&fallback_sql)
                    .bind(format!("%{escaped}%"))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    pub async fn insert(
        &self,
        provider_id: Option<&str>,
        name: &str,
        normalized_name: &str,
        genres: &[String],
        image_url: Option<&str>,
        popularity: i32,
        followers: i64,
        bio_summary: Option<&str>,
        bio_long: Option<&str>,
    ) -> Result<Artist, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO artists
                (provider_id, name, normalized_name, genres, image_url,
                 popularity, followers, bio_summary, bio_long, is_hidden,
                 created_at, updated_at, last_refreshed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, now(), now(), now())
            RETURNING {ARTIST_COLUMNS}"#
        );
        sqlx::query_as::<_, Artist>(&sql)
            .bind(provider_id)
            .bind(name)
            .bind(normalized_name)
            .bind(genres)
            .bind(image_url)
            .bind(popularity)
            .bind(followers)
            .bind(bio_summary)
            .bind(bio_long)
            .fetch_one(&self.pool)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_enrichment(
        &self,
        id: i64,
        genres: &[String],
        image_url: Option<&str>,
        popularity: i32,
        followers: i64,
        bio_summary: Option<&str>,
        bio_long: Option<&str>,
    ) -> Result<Artist, sqlx::Error> {
        let sql = format!(
            r#"UPDATE artists SET
                genres = $2, image_url = $3, popularity = $4, followers = $5,
                bio_summary = $6, bio_long = $7, updated_at = now(), last_refreshed_at = now()
            WHERE id = $1
            RETURNING {ARTIST_COLUMNS}"#
        );
        sqlx::query_as::<_, Artist>(&sql)
            .bind(id)
            .bind(genres)
            .bind(image_url)
            .bind(popularity)
            .bind(followers)
            .bind(bio_summary)
            .bind(bio_long)
            .fetch_one(&self.pool)
            .await
    }

    /// Artists whose `last_refreshed_at` predates `max_age_hours` (§4.5).
    pub async fn find_stale(&self, max_age_hours: i64, limit: i64) -> Result<Vec<Artist>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {ARTIST_COLUMNS} FROM artists
            WHERE is_hidden = false
              AND (last_refreshed_at IS NULL OR last_refreshed_at < now() - ($1 || ' hours')::interval)
            ORDER BY last_refreshed_at ASC NULLS FIRST
            LIMIT $2"#
        );
        sqlx::query_as::<_, Artist>(&sql)
            .bind(max_age_hours)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Artists with an empty genre list, ranked by popularity desc, for the
    /// Genre Backfill loop (§4.8).
    pub async fn find_missing_genres(&self, limit: i64) -> Result<Vec<Artist>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {ARTIST_COLUMNS} FROM artists
            WHERE is_hidden = false AND cardinality(genres) = 0
            ORDER BY popularity DESC
            LIMIT $1"#
        );
        sqlx::query_as::<_, Artist>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Artists missing bio, genres, or an image, for the Daily Refresh
    /// loop's opportunistic gap-filling pass (§4.8).
    pub async fn find_missing_metadata(&self, limit: i64) -> Result<Vec<Artist>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {ARTIST_COLUMNS} FROM artists
            WHERE is_hidden = false
              AND (bio_summary IS NULL OR cardinality(genres) = 0 OR image_url IS NULL)
            ORDER BY popularity DESC
            LIMIT $1"#
        );
        sqlx::query_as::<_, Artist>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Attaches a provider id to a row that was created before a mapping
    /// existed, used by the Catalog Writer's normalized-name fallback path
    /// (§4.4, `app/crud.py` upsert shape).
    pub async fn set_provider_id(&self, id: i64, provider_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE artists SET provider_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Artists sharing any of `genres`, excluding `exclude_ids`, ranked by
    /// popularity (`genre-suggestions`, §4.10).
    pub async fn find_by_genres_excluding(
        &self,
        genres: &[String],
        exclude_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Artist>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {ARTIST_COLUMNS} FROM artists
            WHERE genres && $1 AND is_hidden = false AND NOT (id = ANY($2))
            ORDER BY popularity DESC
            LIMIT $3"#
        );
        sqlx::query_as::<_, Artist>(&sql)
            .bind(genres)
            .bind(exclude_ids)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM artists").fetch_one(&self.pool).await
    }

    /// True if the artist row itself is favorited directly (§3, §4.4
    /// protected-deletion invariant).
    pub async fn is_favorited(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE entity_kind = 'artist' AND entity_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    /// True if any album or track owned by the artist is favorited, so
    /// cascading the artist delete would silently drop a protected row
    /// (§3 "Deletion of an Artist cascades ... and is refused if any
    /// favorite references it").
    pub async fn has_favorited_descendant(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                SELECT 1 FROM favorites f
                JOIN albums al ON f.entity_kind = 'album' AND f.entity_id = al.id
                WHERE al.artist_id = $1
                UNION
                SELECT 1 FROM favorites f
                JOIN tracks t ON f.entity_kind = 'track' AND f.entity_id = t.id
                WHERE t.artist_id = $1
            )"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes the artist row. Callers must have already checked
    /// favorite-protection and removed dependent albums/tracks/aliases.
    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artists WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_columns_constant_well_formed() {
        assert!(ARTIST_COLUMNS.contains("normalized_name"));
    }
}
