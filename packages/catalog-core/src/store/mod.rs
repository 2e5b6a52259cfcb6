//! Entity Store adapter (C1, §3, §4.1): the repository layer the rest of
//! the catalog core is built on, one repository per table following the
//! teacher's `repositories/` convention.

mod alias;
mod album;
mod artist;
mod chart;
mod columns;
mod favorite;
mod search_cache;
mod track;
mod youtube_link;

pub use alias::AliasRepository;
pub use album::AlbumRepository;
pub use artist::ArtistRepository;
pub use chart::ChartRepository;
pub use columns::escape_ilike;
pub use favorite::FavoriteRepository;
pub use search_cache::SearchCacheRepository;
pub use track::TrackRepository;
pub use youtube_link::YoutubeLinkRepository;

use sqlx::PgPool;

/// Aggregates the per-table repositories behind a single handle so callers
/// don't have to construct each one individually.
#[derive(Clone)]
pub struct EntityStore {
    pub artists: ArtistRepository,
    pub albums: AlbumRepository,
    pub tracks: TrackRepository,
    pub aliases: AliasRepository,
    pub youtube_links: YoutubeLinkRepository,
    pub charts: ChartRepository,
    pub search_cache: SearchCacheRepository,
    pub favorites: FavoriteRepository,
}

impl EntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            artists: ArtistRepository::new(pool.clone()),
            albums: AlbumRepository::new(pool.clone()),
            tracks: TrackRepository::new(pool.clone()),
            aliases: AliasRepository::new(pool.clone()),
            youtube_links: YoutubeLinkRepository::new(pool.clone()),
            charts: ChartRepository::new(pool.clone()),
            search_cache: SearchCacheRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool),
        }
    }
}
