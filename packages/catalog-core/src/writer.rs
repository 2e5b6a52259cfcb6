//! Catalog Writer (C4, §4.4): idempotent upserts into the Entity Store,
//! alias refresh, and the protected-deletion guard. Conflict recovery
//! follows `app/crud.py`'s shape: look up by provider id, fall back to a
//! normalized-name (or, for children, parent-scoped name) lookup, apply
//! field updates, and re-read the conflicting row if a unique violation
//! still slips through a race.

use tracing::{instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::models::{Album, Artist, EntityKind, Track, YoutubeLink, YoutubeLinkStatus};
use crate::store::EntityStore;
use crate::text;

/// Postgres' `unique_violation` SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// True if `err` is a unique-constraint violation, meaning a concurrent
/// writer inserted the same row between our lookup and our insert (§4.1,
/// §4.4 step 3).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[derive(Debug, Clone, Default)]
pub struct ArtistUpsert {
    pub provider_id: Option<String>,
    pub name: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub popularity: i32,
    pub followers: i64,
    pub bio_summary: Option<String>,
    pub bio_long: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumUpsert {
    pub provider_id: Option<String>,
    pub name: String,
    pub artist_id: i64,
    pub release_date: String,
    pub total_tracks: i32,
    pub label: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackUpsert {
    pub provider_id: Option<String>,
    pub name: String,
    pub artist_id: i64,
    pub album_id: Option<i64>,
    pub duration_ms: i64,
    pub popularity: i32,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Clone)]
pub struct CatalogWriter {
    store: EntityStore,
}

impl CatalogWriter {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Read-only access to the underlying repositories, for collaborators
    /// (e.g. the Library Expander) that need a presence check without
    /// duplicating a repository handle of their own.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Idempotent artist upsert: a second call for the same provider id
    /// always updates the same row rather than creating a duplicate (§8).
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn save_artist(&self, input: ArtistUpsert) -> CoreResult<Artist> {
        if input.name.trim().is_empty() {
            return Err(CoreError::validation("artist name must not be empty"));
        }
        let normalized_name = text::normalize(&input.name);

        let existing = match &input.provider_id {
            Some(provider_id) => self.store.artists.find_by_provider_id(provider_id).await?,
            None => None,
        };

        let artist = match existing {
            Some(row) => {
                self.store
                    .artists
                    .update_enrichment(
                        row.id,
                        &input.genres,
                        input.image_url.as_deref(),
                        input.popularity,
                        input.followers,
                        input.bio_summary.as_deref(),
                        input.bio_long.as_deref(),
                    )
                    .await?
            }
            None => {
                let fallback = self.store.artists.find_by_normalized_name(&normalized_name).await?;
                match fallback.into_iter().next() {
                    Some(row) => {
                        if let Some(provider_id) = &input.provider_id {
                            self.store.artists.set_provider_id(row.id, provider_id).await?;
                        }
                        self.store
                            .artists
                            .update_enrichment(
                                row.id,
                                &input.genres,
                                input.image_url.as_deref(),
                                input.popularity,
                                input.followers,
                                input.bio_summary.as_deref(),
                                input.bio_long.as_deref(),
                            )
                            .await?
                    }
                    None => {
                        match self
                            .store
                            .artists
                            .insert(
                                input.provider_id.as_deref(),
                                &input.name,
                                &normalized_name,
                                &input.genres,
                                input.image_url.as_deref(),
                                input.popularity,
                                input.followers,
                                input.bio_summary.as_deref(),
                                input.bio_long.as_deref(),
                            )
                            .await
                        {
                            Ok(row) => row,
                            Err(err) if is_unique_violation(&err) => {
                                warn!(name = %input.name, "artist insert raced a concurrent writer, re-reading conflict row");
                                let conflict = match &input.provider_id {
                                    Some(provider_id) => self.store.artists.find_by_provider_id(provider_id).await?,
                                    None => None,
                                };
                                let conflict = match conflict {
                                    Some(row) => Some(row),
                                    None => {
                                        self.store.artists.find_by_normalized_name(&normalized_name).await?.into_iter().next()
                                    }
                                };
                                let row = conflict.ok_or(err)?;
                                if let Some(provider_id) = &input.provider_id {
                                    self.store.artists.set_provider_id(row.id, provider_id).await?;
                                }
                                self.store
                                    .artists
                                    .update_enrichment(
                                        row.id,
                                        &input.genres,
                                        input.image_url.as_deref(),
                                        input.popularity,
                                        input.followers,
                                        input.bio_summary.as_deref(),
                                        input.bio_long.as_deref(),
                                    )
                                    .await?
                            }
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
            }
        };

        self.refresh_aliases(EntityKind::Artist, artist.id, &artist.name).await?;
        Ok(artist)
    }

    #[instrument(skip(self, input), fields(name = %input.name, artist_id = input.artist_id))]
    pub async fn save_album(&self, input: AlbumUpsert) -> CoreResult<Album> {
        if input.name.trim().is_empty() {
            return Err(CoreError::validation("album name must not be empty"));
        }

        let existing = match &input.provider_id {
            Some(provider_id) => self.store.albums.find_by_provider_id(provider_id).await?,
            None => None,
        };

        let album = match existing {
            Some(row) => {
                self.store
                    .albums
                    .update_enrichment(row.id, input.total_tracks, input.label.as_deref(), input.image_url.as_deref())
                    .await?
            }
            None => {
                let fallback = self.store.albums.find_by_artist_and_name(input.artist_id, &input.name).await?;
                match fallback {
                    Some(row) => {
                        if let Some(provider_id) = &input.provider_id {
                            self.store.albums.set_provider_id(row.id, provider_id).await?;
                        }
                        self.store
                            .albums
                            .update_enrichment(
                                row.id,
                                input.total_tracks,
                                input.label.as_deref(),
                                input.image_url.as_deref(),
                            )
                            .await?
                    }
                    None => {
                        match self
                            .store
                            .albums
                            .insert(
                                input.provider_id.as_deref(),
                                &input.name,
                                input.artist_id,
                                &input.release_date,
                                input.total_tracks,
                                input.label.as_deref(),
                                input.image_url.as_deref(),
                            )
                            .await
                        {
                            Ok(row) => row,
                            Err(err) if is_unique_violation(&err) => {
                                warn!(name = %input.name, "album insert raced a concurrent writer, re-reading conflict row");
                                let conflict = match &input.provider_id {
                                    Some(provider_id) => self.store.albums.find_by_provider_id(provider_id).await?,
                                    None => None,
                                };
                                let conflict = match conflict {
                                    Some(row) => Some(row),
                                    None => self.store.albums.find_by_artist_and_name(input.artist_id, &input.name).await?,
                                };
                                let row = conflict.ok_or(err)?;
                                if let Some(provider_id) = &input.provider_id {
                                    self.store.albums.set_provider_id(row.id, provider_id).await?;
                                }
                                self.store
                                    .albums
                                    .update_enrichment(
                                        row.id,
                                        input.total_tracks,
                                        input.label.as_deref(),
                                        input.image_url.as_deref(),
                                    )
                                    .await?
                            }
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
            }
        };

        self.refresh_aliases(EntityKind::Album, album.id, &album.name).await?;
        Ok(album)
    }

    #[instrument(skip(self, input), fields(name = %input.name, artist_id = input.artist_id))]
    pub async fn save_track(&self, input: TrackUpsert) -> CoreResult<Track> {
        if input.name.trim().is_empty() {
            return Err(CoreError::validation("track name must not be empty"));
        }

        let existing = match &input.provider_id {
            Some(provider_id) => self.store.tracks.find_by_provider_id(provider_id).await?,
            None => None,
        };

        let track = match existing {
            Some(row) => {
                self.store
                    .tracks
                    .update_enrichment(row.id, input.popularity, input.preview_url.as_deref(), input.external_url.as_deref())
                    .await?
            }
            None => {
                let fallback = match input.album_id {
                    Some(album_id) => self.store.tracks.find_by_album_and_name(album_id, &input.name).await?,
                    None => None,
                };
                match fallback {
                    Some(row) => {
                        if let Some(provider_id) = &input.provider_id {
                            self.store.tracks.set_provider_id(row.id, provider_id).await?;
                        }
                        self.store
                            .tracks
                            .update_enrichment(
                                row.id,
                                input.popularity,
                                input.preview_url.as_deref(),
                                input.external_url.as_deref(),
                            )
                            .await?
                    }
                    None => {
                        match self
                            .store
                            .tracks
                            .insert(
                                input.provider_id.as_deref(),
                                &input.name,
                                input.artist_id,
                                input.album_id,
                                input.duration_ms,
                                input.popularity,
                                input.preview_url.as_deref(),
                                input.external_url.as_deref(),
                            )
                            .await
                        {
                            Ok(row) => row,
                            Err(err) if is_unique_violation(&err) => {
                                warn!(name = %input.name, "track insert raced a concurrent writer, re-reading conflict row");
                                let conflict = match &input.provider_id {
                                    Some(provider_id) => self.store.tracks.find_by_provider_id(provider_id).await?,
                                    None => None,
                                };
                                let conflict = match conflict {
                                    Some(row) => Some(row),
                                    None => match input.album_id {
                                        Some(album_id) => self.store.tracks.find_by_album_and_name(album_id, &input.name).await?,
                                        None => None,
                                    },
                                };
                                let row = conflict.ok_or(err)?;
                                if let Some(provider_id) = &input.provider_id {
                                    self.store.tracks.set_provider_id(row.id, provider_id).await?;
                                }
                                self.store
                                    .tracks
                                    .update_enrichment(
                                        row.id,
                                        input.popularity,
                                        input.preview_url.as_deref(),
                                        input.external_url.as_deref(),
                                    )
                                    .await?
                            }
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
            }
        };

        self.refresh_aliases(EntityKind::Track, track.id, &track.name).await?;
        Ok(track)
    }

    /// Generates and stores the alias set for a freshly written entity
    /// (§4.3). Idempotent: the alias table is fully replaced, not appended.
    async fn refresh_aliases(&self, kind: EntityKind, entity_id: i64, name: &str) -> CoreResult<()> {
        let variants: Vec<(String, String, String)> = text::generate_aliases(name)
            .into_iter()
            .map(|alias| {
                let normalized = text::normalize(&alias);
                (alias, normalized, "generated".to_string())
            })
            .collect();
        self.store.aliases.replace_for_entity(kind, entity_id, &variants).await?;
        Ok(())
    }

    /// Upserts a YouTube link, applying the forward-only status precedence
    /// rule (§3 supplement, §5, §9 open question 1).
    #[instrument(skip(self))]
    pub async fn save_youtube_link(
        &self,
        track_provider_id: &str,
        video_id: Option<&str>,
        download_path: Option<&str>,
        status: YoutubeLinkStatus,
        file_size: Option<i64>,
        error_message: Option<&str>,
    ) -> CoreResult<YoutubeLink> {
        let link = self
            .store
            .youtube_links
            .upsert_with_precedence(track_provider_id, video_id, download_path, status, file_size, error_message)
            .await?;
        Ok(link)
    }

    /// Deletes a track, refusing if any user's favorites still reference it
    /// (§4.4 protected-deletion invariant, `app/crud.py::delete_track`).
    #[instrument(skip(self))]
    pub async fn delete_track(&self, track_id: i64) -> CoreResult<()> {
        if self.store.tracks.is_favorited(track_id).await? {
            return Err(CoreError::protected_deletion("track", track_id));
        }
        self.store.aliases.delete_for_entity(EntityKind::Track, track_id).await?;
        let affected = self.store.tracks.delete(track_id).await?;
        if affected == 0 {
            return Err(CoreError::NotFound { resource_type: "track", id: track_id.to_string() });
        }
        Ok(())
    }

    /// Deletes an album and its tracks, refusing if the album or any of its
    /// tracks is favorited (§4.4 protected-deletion invariant).
    #[instrument(skip(self))]
    pub async fn delete_album(&self, album_id: i64) -> CoreResult<()> {
        if self.store.albums.is_favorited(album_id).await? {
            return Err(CoreError::protected_deletion("album", album_id));
        }
        let tracks = self.store.tracks.find_by_album_id(album_id).await?;
        for track in &tracks {
            if self.store.tracks.is_favorited(track.id).await? {
                return Err(CoreError::protected_deletion("track", track.id));
            }
        }
        for track in &tracks {
            self.store.aliases.delete_for_entity(EntityKind::Track, track.id).await?;
            self.store.tracks.delete(track.id).await?;
        }
        self.store.aliases.delete_for_entity(EntityKind::Album, album_id).await?;
        let affected = self.store.albums.delete(album_id).await?;
        if affected == 0 {
            return Err(CoreError::NotFound { resource_type: "album", id: album_id.to_string() });
        }
        Ok(())
    }

    /// Deletes an artist, cascading to its albums, tracks and aliases.
    /// Refused if the artist or any descendant album/track is favorited
    /// (§3 "Deletion of an Artist cascades to its Albums, Tracks, Aliases,
    /// and is refused if any favorite references it").
    #[instrument(skip(self))]
    pub async fn delete_artist(&self, artist_id: i64) -> CoreResult<()> {
        if self.store.artists.is_favorited(artist_id).await? {
            return Err(CoreError::protected_deletion("artist", artist_id));
        }
        if self.store.artists.has_favorited_descendant(artist_id).await? {
            return Err(CoreError::protected_deletion("artist", artist_id));
        }

        let albums = self.store.albums.find_by_artist_id(artist_id).await?;
        for album in &albums {
            let tracks = self.store.tracks.find_by_album_id(album.id).await?;
            for track in &tracks {
                self.store.aliases.delete_for_entity(EntityKind::Track, track.id).await?;
                self.store.tracks.delete(track.id).await?;
            }
            self.store.aliases.delete_for_entity(EntityKind::Album, album.id).await?;
            self.store.albums.delete(album.id).await?;
        }

        // Tracks with no album (singles) still belong directly to the artist.
        let remaining_tracks = self.store.tracks.find_by_artist_id(artist_id).await?;
        for track in &remaining_tracks {
            self.store.aliases.delete_for_entity(EntityKind::Track, track.id).await?;
            self.store.tracks.delete(track.id).await?;
        }

        self.store.aliases.delete_for_entity(EntityKind::Artist, artist_id).await?;
        let affected = self.store.artists.delete(artist_id).await?;
        if affected == 0 {
            return Err(CoreError::NotFound { resource_type: "artist", id: artist_id.to_string() });
        }
        Ok(())
    }
}
