//! YouTube link repository (§5): one row per track, keyed by the track's
//! provider id, with last-writer-wins conflict resolution ordered by
//! [`YoutubeLinkStatus`]'s derived `Ord` (§5 precedence rule).

use sqlx::PgPool;

use super::columns::YOUTUBE_LINK_COLUMNS;
use crate::models::{YoutubeLink, YoutubeLinkStatus};

#[derive(Clone)]
pub struct YoutubeLinkRepository {
    pool: PgPool,
}

impl YoutubeLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_track_provider_id(&self, track_provider_id: &str) -> Result<Option<YoutubeLink>, sqlx::Error> {
        let sql = format!("SELECT {YOUTUBE_LINK_COLUMNS} FROM youtube_links WHERE track_provider_id = $1");
        sqlx::query_as::<_, YoutubeLink>(&sql)
            .bind(track_provider_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Links not yet in a terminal `completed`/`link_found` state, oldest
    /// first, for the resolver's catch-up sweep (§4.7, §9).
    pub async fn find_unresolved(&self, limit: i64) -> Result<Vec<YoutubeLink>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {YOUTUBE_LINK_COLUMNS} FROM youtube_links
            WHERE status NOT IN ('completed', 'link_found')
            ORDER BY updated_at ASC
            LIMIT $1"#
        );
        sqlx::query_as::<_, YoutubeLink>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Upserts a link, applying the last-writer-wins precedence rule: a
    /// concurrent write only overwrites the stored row if its status ranks
    /// >= the stored status under [`YoutubeLinkStatus`]'s `Ord` (§5).
    ///
    /// Runs inside a single transaction so the read-compare-write is
    /// atomic against other resolver workers racing the same track.
    pub async fn upsert_with_precedence(
        &self,
        track_provider_id: &str,
        video_id: Option<&str>,
        download_path: Option<&str>,
        status: YoutubeLinkStatus,
        file_size: Option<i64>,
        error_message: Option<&str>,
    ) -> Result<YoutubeLink, sqlx::Error> {
        let normalized_status = status.normalize_on_write(video_id.is_some());
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {YOUTUBE_LINK_COLUMNS} FROM youtube_links WHERE track_provider_id = $1 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, YoutubeLink>(&sql)
            .bind(track_provider_id)
            .fetch_optional(&mut *tx)
            .await?;

        // error_message is always cleared once a non-empty video_id lands,
        // regardless of whether the status itself advances (§3 supplement).
        let effective_error_message = if video_id.is_some() { None } else { error_message };

        let row = match existing {
            // A write proposing a lower-precedence status never downgrades
            // the stored status; it still lands field updates like
            // `error_message` (§3 supplement, §9 open question 1).
            Some(current) if current.status > normalized_status => {
                let sql = format!(
                    r#"UPDATE youtube_links SET
                        video_id = $2, download_path = $3,
                        file_size = $4, error_message = $5, updated_at = now()
                    WHERE track_provider_id = $1
                    RETURNING {YOUTUBE_LINK_COLUMNS}"#
                );
                sqlx::query_as::<_, YoutubeLink>(&sql)
                    .bind(track_provider_id)
                    .bind(video_id)
                    .bind(download_path)
                    .bind(file_size)
                    .bind(effective_error_message)
                    .fetch_one(&mut *tx)
                    .await?
            }
            Some(_) => {
                let sql = format!(
                    r#"UPDATE youtube_links SET
                        video_id = $2, download_path = $3, status = $4,
                        file_size = $5, error_message = $6, updated_at = now()
                    WHERE track_provider_id = $1
                    RETURNING {YOUTUBE_LINK_COLUMNS}"#
                );
                sqlx::query_as::<_, YoutubeLink>(&sql)
                    .bind(track_provider_id)
                    .bind(video_id)
                    .bind(download_path)
                    .bind(normalized_status)
                    .bind(file_size)
                    .bind(effective_error_message)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                let sql = format!(
                    r#"INSERT INTO youtube_links
                        (track_provider_id, video_id, download_path, status, file_size, error_message, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, now())
                    RETURNING {YOUTUBE_LINK_COLUMNS}"#
                );
                sqlx::query_as::<_, YoutubeLink>(&sql)
                    .bind(track_provider_id)
                    .bind(video_id)
                    .bind(download_path)
                    .bind(normalized_status)
                    .bind(file_size)
                    .bind(effective_error_message)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::YoutubeLinkStatus;

    #[test]
    fn test_precedence_ordering() {
        assert!(YoutubeLinkStatus::Completed > YoutubeLinkStatus::LinkFound);
        assert!(YoutubeLinkStatus::LinkFound > YoutubeLinkStatus::VideoNotFound);
        assert!(YoutubeLinkStatus::VideoNotFound > YoutubeLinkStatus::Missing);
        assert!(YoutubeLinkStatus::Missing > YoutubeLinkStatus::Error);
        assert!(YoutubeLinkStatus::Error > YoutubeLinkStatus::Pending);
    }
}
