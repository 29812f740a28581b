//! Aggregated reporting over stored optimizations and keyword observations.

use chrono::Utc;
use log::debug;
use serde::Serialize;

use crate::constants::STATS_WINDOW_DAYS;
use crate::error::ListingError;
use crate::storage::{
    AsinPerformance, DailyCount, KeywordCount, ModelUsage, ScoreDistribution, Storage,
};

const TOP_KEYWORDS_LIMIT: u32 = 10;
const TOP_ASINS_LIMIT: u32 = 10;

/// Usage statistics over the fixed 30-day window.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub window_days: u32,
    pub daily_counts: Vec<DailyCount>,
    pub model_usage: Vec<ModelUsage>,
    pub top_keywords: Vec<KeywordCount>,
}

/// Performance trends over a caller-chosen window.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsReport {
    pub window_days: u32,
    pub daily_optimizations: Vec<DailyCount>,
    pub score_distribution: ScoreDistribution,
    pub top_performing_asins: Vec<AsinPerformance>,
    pub model_performance: Vec<ModelUsage>,
}

/// Builds the 30-day usage statistics report.
///
/// # Errors
///
/// Returns an error when database operations fail (`Store`).
pub fn stats(storage: &Storage) -> Result<StatsReport, ListingError> {
    let since = window_start(STATS_WINDOW_DAYS);

    let report = StatsReport {
        window_days: STATS_WINDOW_DAYS,
        daily_counts: storage.daily_counts(since)?,
        model_usage: storage.model_usage(since)?,
        top_keywords: storage.top_keywords(since, TOP_KEYWORDS_LIMIT)?,
    };

    debug!(
        "Stats over {} days: {} active days, {} models",
        STATS_WINDOW_DAYS,
        report.daily_counts.len(),
        report.model_usage.len()
    );

    Ok(report)
}

/// Builds the performance trends report over the last `days` days.
///
/// # Errors
///
/// Returns an error when `days` is zero (`InvalidRequest`) or database
/// operations fail (`Store`).
pub fn trends(storage: &Storage, days: u32) -> Result<TrendsReport, ListingError> {
    if days == 0 {
        return Err(ListingError::InvalidRequest(
            "trends window must cover at least one day".to_string(),
        ));
    }

    let since = window_start(days);

    Ok(TrendsReport {
        window_days: days,
        daily_optimizations: storage.daily_counts(since)?,
        score_distribution: storage.score_distribution(since)?,
        top_performing_asins: storage.top_performing_asins(since, TOP_ASINS_LIMIT)?,
        model_performance: storage.model_usage(since)?,
    })
}

fn window_start(days: u32) -> i64 {
    Utc::now().timestamp() - i64::from(days) * 86_400
}
