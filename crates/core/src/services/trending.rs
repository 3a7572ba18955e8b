//! Trending hashtag service.
//!
//! Maintains one record per normalized hashtag: cumulative and per-window
//! occurrence counters, a recency-weighted score, and a bounded history of
//! (time, count, score) samples. Window counters are plain accumulators that
//! shrink only when the explicit reset operations run; they are not derived
//! from wall-clock timestamps.

use std::collections::{BTreeMap, HashSet};

use chirp_common::{AppError, AppResult};
use chirp_db::entities::trend::{
    self, HISTORY_CAP, HistoryPoint, TrendCategory, WindowCounts,
};
use chirp_db::repositories::{LocationFilter, TrendRepository};
use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Score weight for occurrences since the last hourly reset.
const WEIGHT_LAST_1H: i64 = 10;

/// Score weight for occurrences in the six-hour window.
const WEIGHT_LAST_6H: i64 = 5;

/// Score weight for occurrences in the 24-hour window.
const WEIGHT_LAST_24H: i64 = 2;

/// Score weight for occurrences in the seven-day window.
const WEIGHT_LAST_7D: i64 = 1;

/// Bounded retry budget for optimistic writes on a contended tag.
const OPTIMISTIC_RETRY_LIMIT: u32 = 5;

/// Maximum distinct hashtags accepted from one content unit.
const MAX_TAGS_PER_CONTENT: usize = 10;

/// Number of history samples averaged on each side of the growth comparison.
const GROWTH_WINDOW: usize = 6;

/// Trends ranked per category by [`TrendingService::top_by_category`].
const TOP_PER_CATEGORY: usize = 5;

/// Scores above this classify as hot.
const HOT_SCORE_THRESHOLD: i64 = 100;

/// Scores above this classify as trending.
const TRENDING_SCORE_THRESHOLD: i64 = 50;

/// Hours without activity before a trend reads as inactive.
const INACTIVE_AFTER_HOURS: i64 = 24;

/// Compute the recency-weighted trending score from the window counters.
#[must_use]
pub const fn trending_score(counts: &WindowCounts) -> i64 {
    WEIGHT_LAST_1H * counts.last_1h
        + WEIGHT_LAST_6H * counts.last_6h
        + WEIGHT_LAST_24H * counts.last_24h
        + WEIGHT_LAST_7D * counts.last_7d
}

/// Percentage growth between the two most recent [`GROWTH_WINDOW`]-sample
/// spans of a trend's history.
///
/// The slicing is fixed contract: the last six samples against the six
/// preceding them, with a missing earlier span reading as zero growth and a
/// zero earlier average reading as 100% when the recent span is non-zero.
#[must_use]
pub fn growth_rate(history: &[HistoryPoint]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let recent_start = history.len().saturating_sub(GROWTH_WINDOW);
    let earlier_start = history.len().saturating_sub(GROWTH_WINDOW * 2);
    let recent = &history[recent_start..];
    let earlier = &history[earlier_start..recent_start];

    if recent.is_empty() || earlier.is_empty() {
        return 0.0;
    }

    let recent_avg =
        recent.iter().map(|p| p.count).sum::<i64>() as f64 / recent.len() as f64;
    let earlier_avg =
        earlier.iter().map(|p| p.count).sum::<i64>() as f64 / earlier.len() as f64;

    if earlier_avg == 0.0 {
        return if recent_avg > 0.0 { 100.0 } else { 0.0 };
    }

    (recent_avg - earlier_avg) / earlier_avg * 100.0
}

/// Momentum classification of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStatus {
    /// Score above [`HOT_SCORE_THRESHOLD`].
    Hot,
    /// Score above [`TRENDING_SCORE_THRESHOLD`].
    Trending,
    /// Recently seen but below the trending thresholds.
    Active,
    /// No activity within the last day.
    Inactive,
}

/// Classify a trend's momentum from its score and last activity.
#[must_use]
pub fn trend_status(
    score: i64,
    last_activity_at: DateTimeWithTimeZone,
    now: DateTimeWithTimeZone,
) -> TrendStatus {
    if now.signed_duration_since(last_activity_at) > Duration::hours(INACTIVE_AFTER_HOURS) {
        return TrendStatus::Inactive;
    }
    if score > HOT_SCORE_THRESHOLD {
        TrendStatus::Hot
    } else if score > TRENDING_SCORE_THRESHOLD {
        TrendStatus::Trending
    } else {
        TrendStatus::Active
    }
}

/// Location narrowing for ranking queries. Provided subfields are AND'd.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl LocationQuery {
    fn to_filter(&self) -> LocationFilter {
        LocationFilter {
            country: self.country.clone(),
            region: self.region.clone(),
            city: self.city.clone(),
        }
    }
}

/// Parameters for the top-K ranking query.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    #[serde(default)]
    pub category: Option<TrendCategory>,
    #[serde(default)]
    pub location: Option<LocationQuery>,
}

impl Default for TrendingQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            category: None,
            location: None,
        }
    }
}

const fn default_limit() -> u64 {
    10
}

/// Compact trend representation returned by ranking queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub tag: String,
    pub display_tag: String,
    pub tweet_count: i64,
    pub score: i64,
    pub counts: WindowCounts,
    pub category: TrendCategory,
    pub last_activity_at: DateTimeWithTimeZone,
}

impl From<&trend::Model> for TrendSummary {
    fn from(record: &trend::Model) -> Self {
        Self {
            tag: record.tag.clone(),
            display_tag: record.display_tag.clone(),
            tweet_count: record.tweet_count,
            score: record.score,
            counts: record.counts(),
            category: record.category,
            last_activity_at: record.last_activity_at,
        }
    }
}

/// Ranked trends for one category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTrends {
    pub category: TrendCategory,
    pub trends: Vec<TrendSummary>,
}

/// Full trend record plus derived analytics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    pub trend: trend::Model,
    pub growth_rate: f64,
    pub status: TrendStatus,
}

/// Corpus-wide overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_trends: u64,
    pub active_trends: u64,
    pub inactive_trends: u64,
    pub top_trending: Vec<TrendSummary>,
    pub recent_activity: Vec<TrendSummary>,
}

/// A zeroed record for a tag seen for the first time.
fn empty_record(
    tag: &str,
    display_tag: &str,
    now: DateTimeWithTimeZone,
) -> trend::Model {
    trend::Model {
        id: String::new(),
        tag: tag.to_string(),
        display_tag: display_tag.to_string(),
        tweet_count: 0,
        count_1h: 0,
        count_6h: 0,
        count_24h: 0,
        count_7d: 0,
        score: 0,
        peak_count: 0,
        peak_at: None,
        category: TrendCategory::default(),
        location_country: None,
        location_region: None,
        location_city: None,
        is_active: true,
        history: serde_json::json!([]),
        version: 0,
        first_seen_at: now,
        last_activity_at: now,
    }
}

/// Apply one occurrence event to a record snapshot: bump the cumulative and
/// window counters in lockstep, refresh peak and activity, recompute the
/// score, and append a history sample (dropping the oldest beyond the cap).
fn apply_occurrence(
    mut record: trend::Model,
    increment_by: i64,
    now: DateTimeWithTimeZone,
) -> trend::Model {
    record.tweet_count += increment_by;
    record.count_1h += increment_by;
    record.count_6h += increment_by;
    record.count_24h += increment_by;
    record.count_7d += increment_by;
    record.last_activity_at = now;
    // An occurrence on a dormant tag reactivates it.
    record.is_active = true;

    if record.tweet_count > record.peak_count {
        record.peak_count = record.tweet_count;
        record.peak_at = Some(now);
    }

    record.score = trending_score(&record.counts());

    let mut points = record.history_points();
    points.push(HistoryPoint {
        at: now,
        count: record.tweet_count,
        score: record.score,
    });
    if points.len() > HISTORY_CAP {
        let excess = points.len() - HISTORY_CAP;
        points.drain(..excess);
    }
    record.history = serde_json::to_value(&points).unwrap_or_else(|_| serde_json::json!([]));

    record
}

/// Zero the daily windows and recompute the score from what remains.
fn apply_daily_reset(mut record: trend::Model) -> trend::Model {
    record.count_6h = 0;
    record.count_24h = 0;
    record.score = trending_score(&record.counts());
    record
}

/// Service for the trending hashtag engine.
#[derive(Clone)]
pub struct TrendingService {
    trend_repo: TrendRepository,
}

impl TrendingService {
    /// Create a new trending service.
    #[must_use]
    pub const fn new(trend_repo: TrendRepository) -> Self {
        Self { trend_repo }
    }

    /// Record `increment_by` occurrences of a hashtag.
    ///
    /// Creates the record on first sight; otherwise increments all counters
    /// in lockstep, refreshes peak/activity/score, and appends to the
    /// history ledger — one atomic write per attempt, serialized per tag by
    /// the repository's version guard. Returns the updated record.
    pub async fn upsert_occurrence(
        &self,
        tag: &str,
        increment_by: i64,
    ) -> AppResult<trend::Model> {
        let display_tag = tag.trim();
        if display_tag.is_empty() {
            return Err(AppError::Validation("Hashtag must not be empty".to_string()));
        }
        if increment_by < 1 {
            return Err(AppError::Validation(
                "Increment must be at least 1".to_string(),
            ));
        }
        let normalized = display_tag.to_lowercase();

        for _attempt in 0..OPTIMISTIC_RETRY_LIMIT {
            let now: DateTimeWithTimeZone = Utc::now().into();

            match self.trend_repo.find_by_tag(&normalized).await? {
                None => {
                    let record = apply_occurrence(
                        empty_record(&normalized, display_tag, now),
                        increment_by,
                        now,
                    );
                    match self.trend_repo.insert(record).await {
                        Ok(created) => return Ok(created),
                        // Lost the first-occurrence race; re-read the winner's row.
                        Err(AppError::Conflict(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
                Some(current) => {
                    let expected_version = current.version;
                    let next = apply_occurrence(current, increment_by, now);
                    if self
                        .trend_repo
                        .update_guarded(&next, expected_version)
                        .await?
                    {
                        return Ok(trend::Model {
                            version: expected_version + 1,
                            ..next
                        });
                    }
                    // Stale snapshot; re-read and retry.
                }
            }
        }

        Err(AppError::Conflict(format!(
            "Retry budget exhausted updating trend: {normalized}"
        )))
    }

    /// Report the hashtags extracted from one newly created piece of
    /// content: deduplicate case-insensitively and record one occurrence
    /// per unique tag.
    pub async fn on_content_created(&self, tags: &[String]) -> AppResult<Vec<trend::Model>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for tag in tags {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                unique.push(trimmed);
            }
        }

        if unique.len() > MAX_TAGS_PER_CONTENT {
            return Err(AppError::Validation(format!(
                "Content cannot contain more than {MAX_TAGS_PER_CONTENT} hashtags"
            )));
        }

        let mut updated = Vec::with_capacity(unique.len());
        for tag in unique {
            updated.push(self.upsert_occurrence(tag, 1).await?);
        }
        Ok(updated)
    }

    /// Top active trends by score, ties broken by most recent activity.
    pub async fn top_trends(&self, query: &TrendingQuery) -> AppResult<Vec<TrendSummary>> {
        query.validate()?;

        let location = match &query.location {
            Some(location) => {
                let filter = location.to_filter();
                if filter.is_empty() {
                    return Err(AppError::Validation(
                        "Location filter must set at least one of country/region/city"
                            .to_string(),
                    ));
                }
                Some(filter)
            }
            None => None,
        };

        let records = self
            .trend_repo
            .find_top(query.limit, query.category, location.as_ref())
            .await?;
        Ok(records.iter().map(TrendSummary::from).collect())
    }

    /// Top five scored trends per category.
    pub async fn top_by_category(&self) -> AppResult<Vec<CategoryTrends>> {
        let records = self.trend_repo.find_scored_active().await?;

        let mut grouped: BTreeMap<TrendCategory, Vec<TrendSummary>> = BTreeMap::new();
        for record in &records {
            let bucket = grouped.entry(record.category).or_default();
            if bucket.len() < TOP_PER_CATEGORY {
                bucket.push(TrendSummary::from(record));
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(category, trends)| CategoryTrends { category, trends })
            .collect())
    }

    /// Case-insensitive substring search over active trends.
    pub async fn search(&self, query: &str, limit: u64) -> AppResult<Vec<TrendSummary>> {
        let needle = query.trim();
        if needle.is_empty() {
            return Err(AppError::Validation(
                "Search query must not be empty".to_string(),
            ));
        }
        if limit < 1 {
            return Err(AppError::Validation(
                "Search limit must be at least 1".to_string(),
            ));
        }

        let records = self.trend_repo.search(needle, limit).await?;
        Ok(records.iter().map(TrendSummary::from).collect())
    }

    /// Full record plus growth rate and momentum classification.
    pub async fn stats(&self, tag: &str) -> AppResult<TrendStats> {
        let normalized = tag.trim().to_lowercase();
        let record = self
            .trend_repo
            .find_by_tag(&normalized)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trend not found: {normalized}")))?;

        let growth = growth_rate(&record.history_points());
        let now: DateTimeWithTimeZone = Utc::now().into();
        let status = trend_status(record.score, record.last_activity_at, now);

        Ok(TrendStats {
            trend: record,
            growth_rate: growth,
            status,
        })
    }

    /// History samples from the last `since_days` days, oldest first.
    pub async fn history(&self, tag: &str, since_days: i64) -> AppResult<Vec<HistoryPoint>> {
        if since_days < 1 {
            return Err(AppError::Validation(
                "History range must be at least one day".to_string(),
            ));
        }

        let normalized = tag.trim().to_lowercase();
        let record = self
            .trend_repo
            .find_by_tag(&normalized)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trend not found: {normalized}")))?;

        let cutoff: DateTimeWithTimeZone = (Utc::now() - Duration::days(since_days)).into();
        Ok(record
            .history_points()
            .into_iter()
            .filter(|point| point.at >= cutoff)
            .collect())
    }

    /// Corpus-wide counts plus the current top and most recently active
    /// trends.
    pub async fn global_stats(&self) -> AppResult<GlobalStats> {
        let total = self.trend_repo.count_all().await?;
        let active = self.trend_repo.count_active().await?;
        let top = self
            .trend_repo
            .find_top(TOP_PER_CATEGORY as u64, None, None)
            .await?;
        let recent = self.trend_repo.find_recently_active(10).await?;

        Ok(GlobalStats {
            total_trends: total,
            active_trends: active,
            inactive_trends: total.saturating_sub(active),
            top_trending: top.iter().map(TrendSummary::from).collect(),
            recent_activity: recent.iter().map(TrendSummary::from).collect(),
        })
    }

    /// Zero the one-hour window counter of every active trend.
    ///
    /// Scores are left as-is; they self-correct on the next occurrence or
    /// daily reset. Failures are isolated per record. Returns how many
    /// records were updated.
    pub async fn reset_hourly(&self) -> AppResult<u64> {
        let records = self.trend_repo.find_active().await?;

        let mut updated = 0;
        for record in records {
            let tag = record.tag;
            match self.trend_repo.zero_hourly_counter(&tag).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "Hourly reset failed for trend");
                }
            }
        }

        tracing::info!(updated, "Hourly window counters reset");
        Ok(updated)
    }

    /// Zero the six-hour and 24-hour window counters of every active trend
    /// and recompute scores from what remains.
    ///
    /// Each record is updated atomically under the version guard; failures
    /// are isolated per record. Returns how many records were updated.
    pub async fn reset_daily(&self) -> AppResult<u64> {
        let records = self.trend_repo.find_active().await?;

        let mut updated = 0;
        for record in records {
            let tag = record.tag.clone();
            match self.reset_daily_record(record).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "Daily reset failed for trend");
                }
            }
        }

        tracing::info!(updated, "Daily window counters reset");
        Ok(updated)
    }

    async fn reset_daily_record(&self, record: trend::Model) -> AppResult<()> {
        // First attempt reuses the pass's snapshot; retries re-read.
        let mut current = record;
        for _attempt in 0..OPTIMISTIC_RETRY_LIMIT {
            let expected_version = current.version;
            let next = apply_daily_reset(current);
            if self
                .trend_repo
                .update_guarded(&next, expected_version)
                .await?
            {
                return Ok(());
            }

            current = self
                .trend_repo
                .find_by_tag(&next.tag)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Trend not found: {}", next.tag)))?;
        }

        Err(AppError::Conflict(
            "Retry budget exhausted during daily reset".to_string(),
        ))
    }

    /// Deactivate trends with no activity in the last `cutoff_days` days.
    ///
    /// Idempotent: already-dormant records are untouched and nothing is
    /// reactivated. Returns how many records were deactivated.
    pub async fn deactivate_stale(&self, cutoff_days: i64) -> AppResult<u64> {
        if cutoff_days < 1 {
            return Err(AppError::Validation(
                "Staleness cutoff must be at least one day".to_string(),
            ));
        }

        let cutoff: DateTimeWithTimeZone = (Utc::now() - Duration::days(cutoff_days)).into();
        let deactivated = self.trend_repo.deactivate_inactive_since(cutoff).await?;

        if deactivated > 0 {
            tracing::info!(deactivated, cutoff_days, "Deactivated stale trends");
        }
        Ok(deactivated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn sample_point(count: i64) -> HistoryPoint {
        HistoryPoint {
            at: Utc::now().into(),
            count,
            score: count * 18,
        }
    }

    fn create_test_trend(tag: &str, version: i32) -> trend::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        trend::Model {
            id: "t1".to_string(),
            tag: tag.to_string(),
            display_tag: tag.to_string(),
            tweet_count: 1,
            count_1h: 1,
            count_6h: 1,
            count_24h: 1,
            count_7d: 1,
            score: 18,
            peak_count: 1,
            peak_at: Some(now),
            category: TrendCategory::General,
            location_country: None,
            location_region: None,
            location_city: None,
            is_active: true,
            history: serde_json::to_value(vec![sample_point(1)]).unwrap(),
            version,
            first_seen_at: now,
            last_activity_at: now,
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> TrendingService {
        TrendingService::new(TrendRepository::new(Arc::new(db)))
    }

    // === Score calculator ===

    #[test]
    fn test_score_weights() {
        let counts = WindowCounts {
            last_1h: 3,
            last_6h: 3,
            last_24h: 3,
            last_7d: 3,
        };
        assert_eq!(trending_score(&counts), 54);
    }

    #[test]
    fn test_score_zero_counts() {
        assert_eq!(trending_score(&WindowCounts::default()), 0);
    }

    #[test]
    fn test_score_favours_recency() {
        let recent = WindowCounts {
            last_1h: 10,
            last_6h: 0,
            last_24h: 0,
            last_7d: 0,
        };
        let old = WindowCounts {
            last_1h: 0,
            last_6h: 0,
            last_24h: 0,
            last_7d: 10,
        };
        assert!(trending_score(&recent) > trending_score(&old));
    }

    // === Occurrence application ===

    #[test]
    fn test_three_occurrences_of_node() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut record = empty_record("node", "node", now);
        for _ in 0..3 {
            record = apply_occurrence(record, 1, now);
        }

        assert_eq!(record.tweet_count, 3);
        assert_eq!(record.count_1h, 3);
        assert_eq!(record.count_6h, 3);
        assert_eq!(record.count_24h, 3);
        assert_eq!(record.count_7d, 3);
        assert_eq!(record.score, 54);
        assert_eq!(record.peak_count, 3);
    }

    #[test]
    fn test_lockstep_counters_mean_score_is_18x() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut record = empty_record("rust", "Rust", now);
        for _ in 0..7 {
            record = apply_occurrence(record, 2, now);
        }

        assert_eq!(record.tweet_count, 14);
        assert_eq!(record.score, 18 * record.tweet_count);
    }

    #[test]
    fn test_occurrence_reactivates_dormant_record() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut record = create_test_trend("rust", 0);
        record.is_active = false;

        let next = apply_occurrence(record, 1, now);
        assert!(next.is_active);
    }

    #[test]
    fn test_history_capped_at_168_most_recent() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut record = empty_record("rust", "rust", now);
        for _ in 0..200 {
            record = apply_occurrence(record, 1, now);
        }

        let points = record.history_points();
        assert_eq!(points.len(), HISTORY_CAP);
        // The oldest 32 samples were dropped; the rest are in order.
        assert_eq!(points[0].count, 33);
        assert_eq!(points[HISTORY_CAP - 1].count, 200);
    }

    // === Growth analyzer ===

    #[test]
    fn test_growth_rate_needs_two_samples() {
        assert_eq!(growth_rate(&[]), 0.0);
        assert_eq!(growth_rate(&[sample_point(5)]), 0.0);
    }

    #[test]
    fn test_growth_rate_zero_without_earlier_span() {
        // Six or fewer samples leave the earlier span empty.
        let history: Vec<_> = (1..=6).map(sample_point).collect();
        assert_eq!(growth_rate(&history), 0.0);
    }

    #[test]
    fn test_growth_rate_short_earlier_span() {
        // Eight samples: earlier span is the first two, recent the last six.
        let mut history = vec![sample_point(2), sample_point(2)];
        history.extend((0..6).map(|_| sample_point(3)));
        assert_eq!(growth_rate(&history), 50.0);
    }

    #[test]
    fn test_growth_rate_full_spans() {
        let mut history: Vec<_> = (0..6).map(|_| sample_point(4)).collect();
        history.extend((0..6).map(|_| sample_point(6)));
        assert_eq!(growth_rate(&history), 50.0);
    }

    #[test]
    fn test_growth_rate_from_zero_baseline() {
        let mut history: Vec<_> = (0..6).map(|_| sample_point(0)).collect();
        history.extend((0..6).map(|_| sample_point(3)));
        assert_eq!(growth_rate(&history), 100.0);

        let flat: Vec<_> = (0..12).map(|_| sample_point(0)).collect();
        assert_eq!(growth_rate(&flat), 0.0);
    }

    // === Daily reset application ===

    #[test]
    fn test_daily_reset_zeroes_middle_windows_and_rescores() {
        let mut record = create_test_trend("rust", 0);
        record.count_1h = 2;
        record.count_6h = 3;
        record.count_24h = 4;
        record.count_7d = 5;
        record.tweet_count = 5;

        let next = apply_daily_reset(record);
        assert_eq!(next.count_1h, 2);
        assert_eq!(next.count_6h, 0);
        assert_eq!(next.count_24h, 0);
        assert_eq!(next.count_7d, 5);
        assert_eq!(next.score, 10 * 2 + 5);
        assert_eq!(next.tweet_count, 5);
    }

    // === Status classification ===

    #[test]
    fn test_trend_status_thresholds() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        assert_eq!(trend_status(101, now, now), TrendStatus::Hot);
        assert_eq!(trend_status(51, now, now), TrendStatus::Trending);
        assert_eq!(trend_status(10, now, now), TrendStatus::Active);

        let stale: DateTimeWithTimeZone = (Utc::now() - Duration::hours(25)).into();
        assert_eq!(trend_status(500, stale, now), TrendStatus::Inactive);
    }

    // === Service: occurrence ingestion ===

    #[tokio::test]
    async fn test_upsert_rejects_empty_tag() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service.upsert_occurrence("   ", 1).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upsert_rejects_non_positive_increment() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service.upsert_occurrence("rust", 0).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upsert_increments_existing_record() {
        let existing = create_test_trend("rust", 3);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db);
        let updated = service.upsert_occurrence("Rust", 1).await.unwrap();

        assert_eq!(updated.tweet_count, 2);
        assert_eq!(updated.count_1h, 2);
        assert_eq!(updated.score, 36);
        assert_eq!(updated.peak_count, 2);
        assert_eq!(updated.version, 4);
        assert_eq!(updated.history_points().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_retries_on_stale_snapshot() {
        let first_read = create_test_trend("rust", 3);
        let second_read = create_test_trend("rust", 4);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[first_read], [second_read]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db);
        let updated = service.upsert_occurrence("rust", 1).await.unwrap();

        assert_eq!(updated.version, 5);
    }

    #[tokio::test]
    async fn test_upsert_surfaces_conflict_after_retry_budget() {
        let mut db = MockDatabase::new(DatabaseBackend::Postgres);
        for _ in 0..OPTIMISTIC_RETRY_LIMIT {
            db = db
                .append_query_results([[create_test_trend("rust", 3)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }]);
        }

        let service = service_with(db.into_connection());
        let result = service.upsert_occurrence("rust", 1).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_on_content_created_dedups_case_insensitively() {
        let mut db = MockDatabase::new(DatabaseBackend::Postgres);
        for tag in ["rust", "go"] {
            db = db
                .append_query_results([[create_test_trend(tag, 0)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]);
        }

        let service = service_with(db.into_connection());
        let tags = vec![
            "Rust".to_string(),
            "rust".to_string(),
            "RUST".to_string(),
            "go".to_string(),
        ];
        let updated = service.on_content_created(&tags).await.unwrap();

        assert_eq!(updated.len(), 2);
    }

    #[tokio::test]
    async fn test_on_content_created_rejects_excess_tags() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let tags: Vec<String> = (0..11).map(|i| format!("tag{i}")).collect();
        let result = service.on_content_created(&tags).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // === Service: queries ===

    #[tokio::test]
    async fn test_top_trends_maps_summaries() {
        let first = create_test_trend("rust", 0);
        let second = create_test_trend("go", 0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[first, second]])
            .into_connection();

        let service = service_with(db);
        let trends = service
            .top_trends(&TrendingQuery::default())
            .await
            .unwrap();

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].tag, "rust");
        assert_eq!(trends[0].counts.last_1h, 1);
    }

    #[tokio::test]
    async fn test_top_trends_rejects_zero_limit() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let query = TrendingQuery {
            limit: 0,
            ..TrendingQuery::default()
        };
        let result = service.top_trends(&query).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_top_trends_rejects_empty_location_filter() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let query = TrendingQuery {
            location: Some(LocationQuery::default()),
            ..TrendingQuery::default()
        };
        let result = service.top_trends(&query).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_top_by_category_caps_buckets_at_five() {
        let mut records = Vec::new();
        for i in 0..7 {
            let mut record = create_test_trend(&format!("general{i}"), 0);
            record.score = 100 - i64::from(i);
            records.push(record);
        }
        let mut sports = create_test_trend("football", 0);
        sports.category = TrendCategory::Sports;
        sports.score = 40;
        records.push(sports);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([records])
            .into_connection();

        let service = service_with(db);
        let grouped = service.top_by_category().await.unwrap();

        assert_eq!(grouped.len(), 2);
        let general = grouped
            .iter()
            .find(|g| g.category == TrendCategory::General)
            .unwrap();
        assert_eq!(general.trends.len(), 5);
        let sports = grouped
            .iter()
            .find(|g| g.category == TrendCategory::Sports)
            .unwrap();
        assert_eq!(sports.trends.len(), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service.search("  ", 10).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stats_not_found_for_unseen_tag() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<trend::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.stats("unseen").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_includes_growth_and_status() {
        let mut record = create_test_trend("rust", 0);
        record.score = 120;
        let mut history: Vec<_> = (0..6).map(|_| sample_point(2)).collect();
        history.extend((0..6).map(|_| sample_point(3)));
        record.history = serde_json::to_value(&history).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[record]])
            .into_connection();

        let service = service_with(db);
        let stats = service.stats("Rust").await.unwrap();

        assert_eq!(stats.growth_rate, 50.0);
        assert_eq!(stats.status, TrendStatus::Hot);
    }

    #[tokio::test]
    async fn test_history_filters_by_cutoff() {
        let mut record = create_test_trend("rust", 0);
        let old = HistoryPoint {
            at: (Utc::now() - Duration::days(10)).into(),
            count: 1,
            score: 18,
        };
        let recent = HistoryPoint {
            at: Utc::now().into(),
            count: 2,
            score: 36,
        };
        record.history = serde_json::to_value(vec![old, recent]).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[record]])
            .into_connection();

        let service = service_with(db);
        let points = service.history("rust", 7).await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 2);
    }

    #[tokio::test]
    async fn test_history_rejects_non_positive_range() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service.history("rust", 0).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // === Service: maintenance ===

    #[tokio::test]
    async fn test_reset_hourly_counts_updated_records() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                create_test_trend("rust", 0),
                create_test_trend("go", 0),
            ]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db);
        let updated = service.reset_hourly().await.unwrap();

        assert_eq!(updated, 2);
    }

    #[tokio::test]
    async fn test_reset_daily_counts_updated_records() {
        let record = create_test_trend("rust", 2);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[record]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db);
        let updated = service.reset_daily().await.unwrap();

        assert_eq!(updated, 1);
    }

    #[tokio::test]
    async fn test_deactivate_stale_rejects_non_positive_cutoff() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service.deactivate_stale(0).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deactivate_stale_returns_row_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let service = service_with(db);
        let deactivated = service.deactivate_stale(30).await.unwrap();

        assert_eq!(deactivated, 3);
    }
}
