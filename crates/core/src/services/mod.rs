//! Business logic services.

#![allow(missing_docs)]

pub mod trending;

pub use trending::{
    CategoryTrends, GlobalStats, LocationQuery, TrendStats, TrendStatus, TrendSummary,
    TrendingQuery, TrendingService, growth_rate, trend_status, trending_score,
};
