//! Album repository (§3, §4.1).

use sqlx::PgPool;

use super::columns::ALBUM_COLUMNS;
use crate::models::Album;

#[derive(Clone)]
pub struct AlbumRepository {
    pool: PgPool,
}

impl AlbumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Album>, sqlx::Error> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = $1");
        sqlx::query_as::<_, Album>(&sql).bind(id).fetch_optional(&self.pool).await
    }

    pub async fn find_by_provider_id(&self, provider_id: &str) -> Result<Option<Album>, sqlx::Error> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE provider_id = $1");
        sqlx::query_as::<_, Album>(&sql)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_artist_id(&self, artist_id: i64) -> Result<Vec<Album>, sqlx::Error> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE artist_id = $1 ORDER BY release_date DESC");
        sqlx::query_as::<_, Album>(&sql)
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
        release_date: &str,
        total_tracks: i32,
        label: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Album, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO albums
                (provider_id, name, artist_id, release_date, total_tracks, label, image_url,
                 created_at, updated_at, last_refreshed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now(), now())
            RETURNING {ALBUM_COLUMNS}"#
        );
        sqlx::query_as::<_, Album>(&sql)
            .bind(provider_id)
            .bind(name)
            .bind(artist_id)
            .bind(release_date)
            .bind(total_tracks)
            .bind(label)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_enrichment(
        &self,
        id: i64,
        total_tracks: i32,
        label: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Album, sqlx::Error> {
        let sql = format!(
            r#"UPDATE albums SET
                total_tracks = $2, label = $3, image_url = $4,
                updated_at = now(), last_refreshed_at = now()
            WHERE id = $1
            RETURNING {ALBUM_COLUMNS}"#
        );
        sqlx::query_as::<_, Album>(&sql)
            .bind(id)
            .bind(total_tracks)
            .bind(label)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn set_provider_id(&self, id: i64, provider_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE albums SET provider_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Albums by artist whose (case-insensitive) name matches, for the
    /// Catalog Writer's provider-id-miss fallback (§4.4).
    pub async fn find_by_artist_and_name(&self, artist_id: i64, name: &str) -> Result<Option<Album>, sqlx::Error> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE artist_id = $1 AND name = $2");
        sqlx::query_as::<_, Album>(&sql)
            .bind(artist_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_stale(&self, max_age_hours: i64, limit: i64) -> Result<Vec<Album>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {ALBUM_COLUMNS} FROM albums
            WHERE last_refreshed_at IS NULL OR last_refreshed_at < now() - ($1 || ' hours')::interval
            ORDER BY last_refreshed_at ASC NULLS FIRST
            LIMIT $2"#
        );
        sqlx::query_as::<_, Album>(&sql)
            .bind(max_age_hours)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// True if the album row is favorited directly (§4.4 protected-deletion
    /// invariant).
    pub async fn is_favorited(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE entity_kind = 'album' AND entity_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM albums WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
