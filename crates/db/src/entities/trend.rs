//! Trend entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of history samples retained per trend (one week of hourly data).
pub const HISTORY_CAP: usize = 168;

/// Trend categories.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum TrendCategory {
    #[default]
    #[sea_orm(string_value = "general")]
    General,
    #[sea_orm(string_value = "sports")]
    Sports,
    #[sea_orm(string_value = "politics")]
    Politics,
    #[sea_orm(string_value = "entertainment")]
    Entertainment,
    #[sea_orm(string_value = "technology")]
    Technology,
    #[sea_orm(string_value = "news")]
    News,
}

/// One sample in a trend's bounded history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// When the sample was taken.
    pub at: DateTimeWithTimeZone,
    /// Cumulative occurrence count at sampling time.
    pub count: i64,
    /// Trending score at sampling time.
    pub score: i64,
}

/// The four window counters, incremented in lockstep on every occurrence
/// and zeroed only by explicit maintenance resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCounts {
    pub last_1h: i64,
    pub last_6h: i64,
    pub last_24h: i64,
    pub last_7d: i64,
}

/// One record per normalized hashtag, holding cumulative and per-window
/// occurrence counts, the derived trending score, and a bounded history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trend")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Normalized hashtag (lowercase, trimmed, without #)
    #[sea_orm(unique)]
    pub tag: String,

    /// Original casing as first seen
    pub display_tag: String,

    /// Cumulative occurrence count
    #[sea_orm(default_value = 0)]
    pub tweet_count: i64,

    /// Occurrences since the last hourly reset
    #[sea_orm(default_value = 0)]
    pub count_1h: i64,

    /// Occurrences since the last daily reset
    #[sea_orm(default_value = 0)]
    pub count_6h: i64,

    /// Occurrences since the last daily reset
    #[sea_orm(default_value = 0)]
    pub count_24h: i64,

    /// Occurrences, never reset by current maintenance
    #[sea_orm(default_value = 0)]
    pub count_7d: i64,

    /// Weighted trending score, recomputed on counter changes
    #[sea_orm(default_value = 0)]
    pub score: i64,

    /// Highest cumulative count ever observed
    #[sea_orm(default_value = 0)]
    pub peak_count: i64,

    /// When the peak was reached
    #[sea_orm(nullable)]
    pub peak_at: Option<DateTimeWithTimeZone>,

    /// Trend category
    pub category: TrendCategory,

    /// Country for local trends
    #[sea_orm(nullable)]
    pub location_country: Option<String>,

    /// Region for local trends
    #[sea_orm(nullable)]
    pub location_region: Option<String>,

    /// City for local trends
    #[sea_orm(nullable)]
    pub location_city: Option<String>,

    /// Dormant trends are excluded from queries but never deleted
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Bounded FIFO of history samples (at most [`HISTORY_CAP`])
    #[sea_orm(column_type = "JsonBinary")]
    pub history: Json,

    /// Optimistic-concurrency counter, bumped on every write
    #[sea_orm(default_value = 0)]
    pub version: i32,

    pub first_seen_at: DateTimeWithTimeZone,

    pub last_activity_at: DateTimeWithTimeZone,
}

impl Model {
    /// The four window counters as one value.
    #[must_use]
    pub const fn counts(&self) -> WindowCounts {
        WindowCounts {
            last_1h: self.count_1h,
            last_6h: self.count_6h,
            last_24h: self.count_24h,
            last_7d: self.count_7d,
        }
    }

    /// Parse the history column into samples, oldest first.
    ///
    /// A malformed column reads as empty rather than failing the record.
    #[must_use]
    pub fn history_points(&self) -> Vec<HistoryPoint> {
        serde_json::from_value(self.history.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
