//! Chart scraping/matching repository (§4.1 chart tables, referenced by
//! the worker's chart-scraper and chart-matcher loops).

use sqlx::PgPool;

use super::columns::{CHART_ENTRY_COLUMNS, CHART_SCAN_STATE_COLUMNS, TRACK_CHART_STATS_COLUMNS};
use crate::models::{ChartEntryRaw, ChartScanState, TrackChartStats};

#[derive(Clone)]
pub struct ChartRepository {
    pool: PgPool,
}

impl ChartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_raw_entry(
        &self,
        source: &str,
        chart: &str,
        chart_date: chrono::NaiveDate,
        rank: i32,
        title: &str,
        artist: &str,
    ) -> Result<ChartEntryRaw, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO chart_entries_raw (source, chart, chart_date, rank, title, artist)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source, chart, chart_date, rank) DO UPDATE SET title = EXCLUDED.title, artist = EXCLUDED.artist
            RETURNING {CHART_ENTRY_COLUMNS}"#
        );
        sqlx::query_as::<_, ChartEntryRaw>(&sql)
            .bind(source)
            .bind(chart)
            .bind(chart_date)
            .bind(rank)
            .bind(title)
            .bind(artist)
            .fetch_one(&self.pool)
            .await
    }

    /// Raw entries for one chart week, not yet matched to a local track.
    pub async fn find_unmatched_for_date(
        &self,
        source: &str,
        chart: &str,
        chart_date: chrono::NaiveDate,
    ) -> Result<Vec<ChartEntryRaw>, sqlx::Error> {
        let sql = format!(
            r#"SELECT r.{cols} FROM chart_entries_raw r
            LEFT JOIN track_chart_stats s
                ON s.source = r.source AND s.chart = r.chart
                AND s.first_chart_date <= r.chart_date AND s.last_chart_date >= r.chart_date
            WHERE r.source = $1 AND r.chart = $2 AND r.chart_date = $3 AND s.track_id IS NULL
            ORDER BY r.rank ASC"#,
            cols = CHART_ENTRY_COLUMNS
                .trim()
                .split(',')
                .map(|c| c.trim())
                .collect::<Vec<_>>()
                .join(", r.")
        );
        sqlx::query_as::<_, ChartEntryRaw>(&sql)
            .bind(source)
            .bind(chart)
            .bind(chart_date)
            .fetch_all(&self.pool)
            .await
    }

    /// All raw entries for a chart across every scraped week that aren't yet
    /// covered by a `track_chart_stats` window. Used by the chart-matcher
    /// loop's periodic re-join pass, which re-attempts matching against
    /// whatever local artists/tracks exist now rather than at scrape time.
    pub async fn find_all_unmatched(&self, source: &str, chart: &str, limit: i64) -> Result<Vec<ChartEntryRaw>, sqlx::Error> {
        let sql = format!(
            r#"SELECT r.{cols} FROM chart_entries_raw r
            LEFT JOIN track_chart_stats s
                ON s.source = r.source AND s.chart = r.chart
                AND s.first_chart_date <= r.chart_date AND s.last_chart_date >= r.chart_date
            WHERE r.source = $1 AND r.chart = $2 AND s.track_id IS NULL
            ORDER BY r.chart_date ASC, r.rank ASC
            LIMIT $3"#,
            cols = CHART_ENTRY_COLUMNS
                .trim()
                .split(',')
                .map(|c| c.trim())
                .collect::<Vec<_>>()
                .join(", r.")
        );
        sqlx::query_as::<_, ChartEntryRaw>(&sql)
            .bind(source)
            .bind(chart)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_scan_state(&self, source: &str, chart: &str) -> Result<Option<ChartScanState>, sqlx::Error> {
        let sql = format!("SELECT {CHART_SCAN_STATE_COLUMNS} FROM chart_scan_state WHERE source = $1 AND chart = $2");
        sqlx::query_as::<_, ChartScanState>(&sql)
            .bind(source)
            .bind(chart)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn upsert_scan_state(
        &self,
        source: &str,
        chart: &str,
        last_scanned_date: chrono::NaiveDate,
        backfill_complete: bool,
    ) -> Result<ChartScanState, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO chart_scan_state (source, chart, last_scanned_date, backfill_complete)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source, chart) DO UPDATE SET
                last_scanned_date = EXCLUDED.last_scanned_date,
                backfill_complete = EXCLUDED.backfill_complete
            RETURNING {CHART_SCAN_STATE_COLUMNS}"#
        );
        sqlx::query_as::<_, ChartScanState>(&sql)
            .bind(source)
            .bind(chart)
            .bind(last_scanned_date)
            .bind(backfill_complete)
            .fetch_one(&self.pool)
            .await
    }

    /// Recomputes and upserts aggregate chart stats for one track after a
    /// new raw entry is matched to it.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_track_stats(
        &self,
        track_id: i64,
        source: &str,
        chart: &str,
        best_position: i32,
        weeks_on_chart: i32,
        weeks_at_one: i32,
        weeks_top5: i32,
        weeks_top10: i32,
        first_chart_date: chrono::NaiveDate,
        last_chart_date: chrono::NaiveDate,
    ) -> Result<TrackChartStats, sqlx::Error> {
        let sql = format!(
            r#"INSERT INTO track_chart_stats
                (track_id, source, chart, best_position, weeks_on_chart,
                 weeks_at_one, weeks_top5, weeks_top10, first_chart_date, last_chart_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (track_id, source, chart) DO UPDATE SET
                best_position = LEAST(track_chart_stats.best_position, EXCLUDED.best_position),
                weeks_on_chart = EXCLUDED.weeks_on_chart,
                weeks_at_one = EXCLUDED.weeks_at_one,
                weeks_top5 = EXCLUDED.weeks_top5,
                weeks_top10 = EXCLUDED.weeks_top10,
                first_chart_date = LEAST(track_chart_stats.first_chart_date, EXCLUDED.first_chart_date),
                last_chart_date = GREATEST(track_chart_stats.last_chart_date, EXCLUDED.last_chart_date)
            RETURNING {TRACK_CHART_STATS_COLUMNS}"#
        );
        sqlx::query_as::<_, TrackChartStats>(&sql)
            .bind(track_id)
            .bind(source)
            .bind(chart)
            .bind(best_position)
            .bind(weeks_on_chart)
            .bind(weeks_at_one)
            .bind(weeks_top5)
            .bind(weeks_top10)
            .bind(first_chart_date)
            .bind(last_chart_date)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_stats_for_track(&self, track_id: i64) -> Result<Vec<TrackChartStats>, sqlx::Error> {
        let sql = format!("SELECT {TRACK_CHART_STATS_COLUMNS} FROM track_chart_stats WHERE track_id = $1");
        sqlx::query_as::<_, TrackChartStats>(&sql)
            .bind(track_id)
            .fetch_all(&self.pool)
            .await
    }
}
