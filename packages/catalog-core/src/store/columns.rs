//! Shared SQL column lists and escaping helpers for the store repositories.

/// Escape special characters in ILIKE patterns to prevent pattern injection.
pub fn escape_ilike(pattern: &str) -> String {
    pattern
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

/// Minimum `pg_trgm` similarity for an alias hit to count as a candidate
/// (§4.1, `app/api/search.py::_alias_score_map`'s `min_similarity=0.3`).
pub const ALIAS_MIN_SIMILARITY: f64 = 0.3;

/// Prefixes each column in a column-list constant with a table alias, e.g.
/// `prefix_columns(ARTIST_COLUMNS, "a")` -> `"a.id, a.provider_id, ..."`.
pub fn prefix_columns(columns: &str, alias: &str) -> String {
    columns.trim().split(',').map(|c| format!("{alias}.{}", c.trim())).collect::<Vec<_>>().join(", ")
}

pub const ARTIST_COLUMNS: &str = r#"
    id, provider_id, name, normalized_name, genres, image_url,
    popularity, followers, bio_summary, bio_long, is_hidden,
    created_at, updated_at, last_refreshed_at
"#;

pub const ALBUM_COLUMNS: &str = r#"
    id, provider_id, name, artist_id, release_date, total_tracks,
    label, image_url, created_at, updated_at, last_refreshed_at
"#;

pub const TRACK_COLUMNS: &str = r#"
    id, provider_id, name, artist_id, album_id, duration_ms, popularity,
    preview_url, external_url, download_path,
    created_at, updated_at, last_refreshed_at
"#;

pub const ALIAS_COLUMNS: &str = r#"
    id, entity_kind, entity_id, alias, normalized_alias, source
"#;

pub const YOUTUBE_LINK_COLUMNS: &str = r#"
    id, track_provider_id, video_id, download_path, status,
    file_size, error_message, updated_at
"#;

pub const CHART_ENTRY_COLUMNS: &str = r#"
    id, source, chart, chart_date, rank, title, artist
"#;

pub const TRACK_CHART_STATS_COLUMNS: &str = r#"
    track_id, source, chart, best_position, weeks_on_chart,
    weeks_at_one, weeks_top5, weeks_top10, first_chart_date, last_chart_date
"#;

pub const CHART_SCAN_STATE_COLUMNS: &str = r#"
    source, chart, last_scanned_date, backfill_complete
"#;

pub const SEARCH_CACHE_COLUMNS: &str = r#"
    cache_key, payload, created_at, updated_at, context
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ilike_all_special() {
        assert_eq!(escape_ilike(r"100%_\test"), r"100\%\_\\test");
    }

    #[test]
    fn test_escape_ilike_empty() {
        assert_eq!(escape_ilike(""), "");
    }
}
