//! History reads over stored optimizations and the feedback entry point.
//!
//! Every read path decodes stored keyword payloads through the recovery
//! parser and attaches the action trail of each optimization.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::asin::require_valid;
use crate::error::ListingError;
use crate::keywords::parse_stored_keywords;
use crate::storage::{ActionEntry, HistoryFilters, Optimization, Pagination, Storage};

/// One stored optimization in a history response, keywords decoded and
/// actions attached.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub asin: String,
    pub generated_title: String,
    pub generated_bullets: String,
    pub generated_description: String,
    pub generated_keywords: Vec<String>,
    pub score: u8,
    pub model: String,
    pub elapsed_ms: u64,
    pub call_count: u32,
    pub created_at: DateTime<Utc>,
    pub actions: Vec<ActionEntry>,
}

/// Page of history entries with its pagination metadata.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub pagination: Pagination,
}

/// Returns the optimization history of one ASIN, most recent first.
///
/// # Errors
///
/// Returns an error if:
/// * The ASIN is malformed (`InvalidAsin`)
/// * Database operations fail (`Store`)
pub fn history(
    storage: &Storage,
    asin: &str,
    page: u32,
    limit: u32,
) -> Result<HistoryPage, ListingError> {
    require_valid(asin)?;

    let (optimizations, pagination) = storage.history(asin, page, limit)?;
    let entries = attach_actions(storage, optimizations)?;

    debug!("History page {page} for ASIN {asin}: {} entries", entries.len());

    Ok(HistoryPage {
        entries,
        pagination,
    })
}

/// Returns optimization history across all ASINs, narrowed by the supplied
/// filters, most recent first.
///
/// # Errors
///
/// Returns an error when database operations fail (`Store`).
pub fn history_filtered(
    storage: &Storage,
    filters: &HistoryFilters,
    page: u32,
    limit: u32,
) -> Result<HistoryPage, ListingError> {
    let (optimizations, pagination) = storage.search_history(filters, page, limit)?;
    let entries = attach_actions(storage, optimizations)?;

    Ok(HistoryPage {
        entries,
        pagination,
    })
}

fn attach_actions(
    storage: &Storage,
    optimizations: Vec<Optimization>,
) -> Result<Vec<HistoryEntry>, ListingError> {
    optimizations
        .into_iter()
        .map(|optimization| {
            let actions = storage.actions_for(optimization.id)?;
            Ok(HistoryEntry {
                id: optimization.id,
                asin: optimization.asin,
                generated_title: optimization.generated_title,
                generated_bullets: optimization.generated_bullets,
                generated_description: optimization.generated_description,
                generated_keywords: parse_stored_keywords(Some(
                    &optimization.generated_keywords,
                )),
                score: optimization.score,
                model: optimization.model,
                elapsed_ms: optimization.elapsed_ms,
                call_count: optimization.call_count,
                created_at: optimization.created_at,
                actions,
            })
        })
        .collect()
}

/// User feedback on one optimization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FeedbackInput {
    /// Star rating, valid range 1 through 5.
    pub rating: i64,
    pub comments: Option<String>,
    pub helpful: Option<bool>,
    pub improvements: Option<String>,
}

/// Acknowledgment of a recorded feedback action.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAck {
    pub optimization_id: i64,
    pub asin: String,
    pub rating: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Records feedback against a stored optimization as a `feedback` action.
///
/// The rating is validated before anything is written; an out-of-range rating
/// leaves the database untouched.
///
/// # Errors
///
/// Returns an error if:
/// * The rating is outside 1 through 5 (`InvalidFeedback`)
/// * No optimization exists with the given id (`NotFound`)
/// * Database operations fail (`Store`)
pub fn submit_feedback(
    storage: &Storage,
    optimization_id: i64,
    feedback: &FeedbackInput,
) -> Result<FeedbackAck, ListingError> {
    if !(1..=5).contains(&feedback.rating) {
        return Err(ListingError::InvalidFeedback(format!(
            "rating must be between 1 and 5, got {}",
            feedback.rating
        )));
    }

    let optimization = storage.get_optimization(optimization_id)?.ok_or_else(|| {
        ListingError::NotFound(format!("no optimization with id {optimization_id}"))
    })?;

    let payload = serde_json::json!({
        "rating": feedback.rating,
        "comments": feedback.comments,
        "helpful": feedback.helpful,
        "improvements": feedback.improvements,
    })
    .to_string();

    let recorded_at = Utc::now();
    storage.append_action(&optimization.asin, optimization_id, "feedback", Some(&payload))?;

    info!("Recorded feedback on optimization {optimization_id} rated {}", feedback.rating);

    Ok(FeedbackAck {
        optimization_id,
        asin: optimization.asin,
        rating: feedback.rating,
        recorded_at,
    })
}
