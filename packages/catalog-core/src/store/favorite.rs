//! Favorites repository (§4.10): a thin read layer over the `favorites`
//! table. User identity and the favorites/ratings write API are external
//! collaborators outside this crate's scope (§1); this repository only
//! answers the queries the Curated Lists Cache and the Catalog Writer's
//! protected-deletion check need.

use sqlx::PgPool;

use super::columns::TRACK_COLUMNS;
use crate::models::Track;

#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Favorited tracks that also carry a resolved YouTube link, newest
    /// favorite first (`favorites-with-link`, §4.10).
    pub async fn find_favorited_with_youtube_link(&self, limit: i64) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {cols} FROM tracks t
            JOIN favorites f ON f.entity_kind = 'track' AND f.entity_id = t.id
            JOIN youtube_links yl ON yl.track_provider_id = t.provider_id
            WHERE yl.status IN ('completed', 'link_found') AND yl.video_id IS NOT NULL
            ORDER BY f.id DESC
            LIMIT $1"#,
            cols = TRACK_COLUMNS
                .trim()
                .split(',')
                .map(|c| format!("t.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        sqlx::query_as::<_, Track>(&sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Artist ids with at least one favorited track, used to seed
    /// genre-suggestions without recommending genres the listener hasn't
    /// shown any interest in (§4.10).
    pub async fn find_favorited_artist_ids(&self, limit: i64) -> Result<Vec<i64>, sqlx::Error> {
        let sql = r#"SELECT DISTINCT t.artist_id FROM tracks t
            JOIN favorites f ON f.entity_kind = 'track' AND f.entity_id = t.id
            LIMIT $1"#;
        sqlx::query_scalar::<_, i64>(sql).bind(limit).fetch_all(&self.pool).await
    }

    /// Every artist favorited either directly or through a favorited track,
    /// the Daily Refresh loop's seed set for `expand_from_seed` (§4.8).
    pub async fn find_all_favorited_artist_ids(&self, limit: i64) -> Result<Vec<i64>, sqlx::Error> {
        let sql = r#"
            SELECT DISTINCT artist_id FROM (
                SELECT f.entity_id AS artist_id FROM favorites f WHERE f.entity_kind = 'artist'
                UNION
                SELECT t.artist_id FROM tracks t
                JOIN favorites f ON f.entity_kind = 'track' AND f.entity_id = t.id
            ) AS combined
            LIMIT $1"#;
        sqlx::query_scalar::<_, i64>(sql).bind(limit).fetch_all(&self.pool).await
    }
}
