//! Trend repository.

use std::sync::Arc;

use crate::entities::{Trend, trend};
use chirp_common::{AppError, AppResult, IdGenerator};
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

/// Location filter for trend queries. Provided subfields are AND'd.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    /// Country to match exactly.
    pub country: Option<String>,
    /// Region to match exactly.
    pub region: Option<String>,
    /// City to match exactly.
    pub city: Option<String>,
}

impl LocationFilter {
    /// Whether any subfield is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none() && self.city.is_none()
    }
}

/// Trend repository for database operations.
///
/// Writes follow an optimistic-concurrency discipline: every row carries a
/// `version` counter, and [`Self::update_guarded`] only applies when the
/// caller's snapshot is still current. Callers retry on a stale snapshot.
#[derive(Clone)]
pub struct TrendRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl TrendRepository {
    /// Create a new trend repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a trend by its normalized tag.
    pub async fn find_by_tag(&self, tag: &str) -> AppResult<Option<trend::Model>> {
        Trend::find()
            .filter(trend::Column::Tag.eq(tag))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a brand-new trend record.
    ///
    /// A concurrent insert of the same tag loses to the unique constraint and
    /// surfaces as [`AppError::Conflict`] so the caller can re-read and retry.
    pub async fn insert(&self, record: trend::Model) -> AppResult<trend::Model> {
        let model = trend::ActiveModel {
            id: Set(self.id_gen.generate()),
            tag: Set(record.tag),
            display_tag: Set(record.display_tag),
            tweet_count: Set(record.tweet_count),
            count_1h: Set(record.count_1h),
            count_6h: Set(record.count_6h),
            count_24h: Set(record.count_24h),
            count_7d: Set(record.count_7d),
            score: Set(record.score),
            peak_count: Set(record.peak_count),
            peak_at: Set(record.peak_at),
            category: Set(record.category),
            location_country: Set(record.location_country),
            location_region: Set(record.location_region),
            location_city: Set(record.location_city),
            is_active: Set(record.is_active),
            history: Set(record.history),
            version: Set(0),
            first_seen_at: Set(record.first_seen_at),
            last_activity_at: Set(record.last_activity_at),
        };

        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Trend already created concurrently".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Apply a full-record update if the caller's version snapshot is current.
    ///
    /// Returns `false` when another writer got there first (zero rows
    /// matched the tag + version filter).
    pub async fn update_guarded(
        &self,
        next: &trend::Model,
        expected_version: i32,
    ) -> AppResult<bool> {
        use sea_orm::sea_query::Expr;

        let result = Trend::update_many()
            .col_expr(trend::Column::TweetCount, Expr::value(next.tweet_count))
            .col_expr(trend::Column::Count1h, Expr::value(next.count_1h))
            .col_expr(trend::Column::Count6h, Expr::value(next.count_6h))
            .col_expr(trend::Column::Count24h, Expr::value(next.count_24h))
            .col_expr(trend::Column::Count7d, Expr::value(next.count_7d))
            .col_expr(trend::Column::Score, Expr::value(next.score))
            .col_expr(trend::Column::PeakCount, Expr::value(next.peak_count))
            .col_expr(trend::Column::PeakAt, Expr::value(next.peak_at))
            .col_expr(trend::Column::IsActive, Expr::value(next.is_active))
            .col_expr(trend::Column::History, Expr::value(next.history.clone()))
            .col_expr(
                trend::Column::LastActivityAt,
                Expr::value(next.last_activity_at),
            )
            .col_expr(trend::Column::Version, Expr::value(expected_version + 1))
            .filter(trend::Column::Tag.eq(next.tag.as_str()))
            .filter(trend::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Zero the hourly window counter of one record in place.
    ///
    /// Single-statement update, atomic per record; the score is deliberately
    /// left untouched. Returns `false` if the tag vanished.
    pub async fn zero_hourly_counter(&self, tag: &str) -> AppResult<bool> {
        use sea_orm::sea_query::Expr;

        let result = Trend::update_many()
            .col_expr(trend::Column::Count1h, Expr::value(0_i64))
            .col_expr(
                trend::Column::Version,
                Expr::col(trend::Column::Version).add(1),
            )
            .filter(trend::Column::Tag.eq(tag))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Deactivate every active record whose last activity predates `cutoff`.
    ///
    /// Idempotent bulk update; returns the number of rows deactivated.
    pub async fn deactivate_inactive_since(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        use sea_orm::sea_query::Expr;

        let result = Trend::update_many()
            .col_expr(trend::Column::IsActive, Expr::value(false))
            .col_expr(
                trend::Column::Version,
                Expr::col(trend::Column::Version).add(1),
            )
            .filter(trend::Column::IsActive.eq(true))
            .filter(trend::Column::LastActivityAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// All active records (for the daily maintenance pass).
    pub async fn find_active(&self) -> AppResult<Vec<trend::Model>> {
        Trend::find()
            .filter(trend::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Top active trends by score, optionally narrowed by category and
    /// location; ties broken by most recent activity.
    pub async fn find_top(
        &self,
        limit: u64,
        category: Option<trend::TrendCategory>,
        location: Option<&LocationFilter>,
    ) -> AppResult<Vec<trend::Model>> {
        let mut query = Trend::find().filter(trend::Column::IsActive.eq(true));

        if let Some(category) = category {
            query = query.filter(trend::Column::Category.eq(category));
        }

        if let Some(location) = location {
            if let Some(country) = &location.country {
                query = query.filter(trend::Column::LocationCountry.eq(country));
            }
            if let Some(region) = &location.region {
                query = query.filter(trend::Column::LocationRegion.eq(region));
            }
            if let Some(city) = &location.city {
                query = query.filter(trend::Column::LocationCity.eq(city));
            }
        }

        query
            .order_by_desc(trend::Column::Score)
            .order_by_desc(trend::Column::LastActivityAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active records with a positive score, best first (for per-category
    /// grouping).
    pub async fn find_scored_active(&self) -> AppResult<Vec<trend::Model>> {
        Trend::find()
            .filter(trend::Column::IsActive.eq(true))
            .filter(trend::Column::Score.gt(0))
            .order_by_desc(trend::Column::Score)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Substring search over active trends.
    ///
    /// The needle is matched against the normalized tag and the display
    /// form; normalizing the needle makes the match case-insensitive.
    pub async fn search(&self, needle: &str, limit: u64) -> AppResult<Vec<trend::Model>> {
        let needle_lower = needle.to_lowercase();

        Trend::find()
            .filter(trend::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(trend::Column::Tag.contains(&needle_lower))
                    .add(trend::Column::DisplayTag.contains(needle)),
            )
            .order_by_desc(trend::Column::Score)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total number of trend records, active or not.
    pub async fn count_all(&self) -> AppResult<u64> {
        Trend::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of active trend records.
    pub async fn count_active(&self) -> AppResult<u64> {
        Trend::find()
            .filter(trend::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recently active trends.
    pub async fn find_recently_active(&self, limit: u64) -> AppResult<Vec<trend::Model>> {
        Trend::find()
            .filter(trend::Column::IsActive.eq(true))
            .order_by_desc(trend::Column::LastActivityAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
