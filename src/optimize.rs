//! Generation of optimized listing copy through an LLM model, guarded by the
//! one hour freshness gate and persisted together with its audit action.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use llm::chat::{ChatMessage, ChatProvider};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rate_guard::{RateLimit, StdTokenBucket};
use regex::Regex;
use serde::Serialize;

use crate::asin::require_valid;
use crate::constants::{
    BULLETS_PROMPT_TEMPLATE, DESCRIPTION_PROMPT_TEMPLATE, GENERATION_CALLS,
    KEYWORDS_PROMPT_TEMPLATE, MAX_KEYWORDS, MAX_OPTIMIZE_BATCH, THINK_STRIPPER,
    TITLE_PROMPT_TEMPLATE,
};
use crate::error::ListingError;
use crate::freshness::{FreshnessKind, Provenance, is_fresh};
use crate::keywords::{encode_keywords, parse_stored_keywords};
use crate::score::{ScoreBreakdown, score_generation};
use crate::storage::{NewOptimization, Optimization, Product, Storage};

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));

/// Keyword rows written by the generation path carry this source marker.
const KEYWORD_SOURCE_SUGGESTED: &str = "suggested";

/// Configuration containing shared data for generation operations.
pub struct OptimizeContext<'a> {
    /// LLM model used for every generation call.
    pub model: &'a dyn ChatProvider,
    /// Identifier recorded with each stored optimization.
    pub model_name: &'a str,
    /// Rate limiter shared by every generation call in the process.
    pub rate_limiter: Option<&'a StdTokenBucket>,
}

/// Copy produced by one full generation pass. Purely in-memory; the storage
/// layer owns the durable encoding.
#[derive(Clone, PartialEq, Debug)]
pub struct GeneratedCopy {
    pub title: String,
    pub bullets: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// Full optimization payload returned to callers, cached or freshly generated.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub provenance: Provenance,
    pub id: i64,
    pub asin: String,
    pub original: Product,
    pub generated_title: String,
    pub generated_bullets: String,
    pub generated_description: String,
    pub generated_keywords: Vec<String>,
    pub score: u8,
    pub factors: Vec<&'static str>,
    pub model: String,
    pub elapsed_ms: u64,
    pub call_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Optimizes a stored product listing, serving a recent generation from the
/// database when one exists.
///
/// The product must already be in the database; optimization never triggers a
/// fetch. Unless `force` is set, an optimization younger than one hour is
/// returned as-is with `cached` provenance and no model calls.
///
/// # Errors
///
/// Returns an error if:
/// * The ASIN is malformed (`InvalidAsin`)
/// * No product row exists for the ASIN (`NotFound`)
/// * Any of the four model calls fails (`Generation`)
/// * Database operations fail (`Store`)
pub async fn optimize_product(
    storage: &Storage,
    ctx: &OptimizeContext<'_>,
    asin: &str,
    force: bool,
) -> Result<OptimizationResult, ListingError> {
    require_valid(asin)?;

    let product = storage.get_product(asin)?.ok_or_else(|| {
        ListingError::NotFound(format!("no stored product for ASIN {asin}; fetch it first"))
    })?;

    if !force
        && let Some(stored) = storage.latest_optimization(asin)?
        && is_fresh(stored.created_at, FreshnessKind::Generated, Utc::now())
    {
        info!("Serving stored optimization {} for ASIN {asin}", stored.id);
        return Ok(cached_result(product, stored));
    }

    info!("Generating optimized copy for ASIN {asin} with model {}", ctx.model_name);

    let started = Instant::now();
    let generated = run_generation(ctx, &product).await?;
    let elapsed_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

    let breakdown = score_generation(&product, &generated);
    let encoded_keywords = encode_keywords(&generated.keywords);
    let created_at = Utc::now();

    let id = storage.insert_optimization(&NewOptimization {
        asin,
        generated_title: &generated.title,
        generated_bullets: &generated.bullets,
        generated_description: &generated.description,
        generated_keywords: &encoded_keywords,
        score: breakdown.score,
        model: ctx.model_name,
        elapsed_ms,
        call_count: GENERATION_CALLS,
        created_at,
    })?;

    record_keywords(storage, asin, &generated.keywords);

    debug!("Stored optimization {id} for ASIN {asin} scored {}", breakdown.score);

    Ok(fresh_result(
        id,
        product,
        generated,
        breakdown,
        ctx.model_name,
        elapsed_ms,
        created_at,
    ))
}

/// Report of a batch optimization run. Failed records never abort the batch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeBatchReport {
    pub successful: Vec<OptimizationResult>,
    pub failed: Vec<BatchFailure>,
    pub summary: BatchSummary,
}

/// One record that failed inside a batch, with its error classification.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub asin: String,
    pub error: String,
    pub kind: &'static str,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Optimizes up to five listings strictly sequentially, pausing `delay_ms`
/// between consecutive records. Each record goes through the same freshness
/// gate as the single-record path.
///
/// # Errors
///
/// Returns `InvalidRequest` when the batch is empty or exceeds the batch
/// limit. Per-record failures are reported inside the result instead.
pub async fn optimize_batch(
    storage: &Storage,
    ctx: &OptimizeContext<'_>,
    asins: &[String],
    force: bool,
    delay_ms: u64,
) -> Result<OptimizeBatchReport, ListingError> {
    if asins.is_empty() {
        return Err(ListingError::InvalidRequest(
            "optimize batch requires at least one ASIN".to_string(),
        ));
    }

    if asins.len() > MAX_OPTIMIZE_BATCH {
        return Err(ListingError::InvalidRequest(format!(
            "optimize batch accepts at most {MAX_OPTIMIZE_BATCH} ASINs, got {}",
            asins.len()
        )));
    }

    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for (index, asin) in asins.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match optimize_product(storage, ctx, asin, force).await {
            Ok(result) => successful.push(result),
            Err(err) => {
                warn!("Batch optimization failed for ASIN {asin}: {err}");
                failed.push(BatchFailure {
                    asin: asin.clone(),
                    error: err.to_string(),
                    kind: err.kind(),
                });
            }
        }
    }

    let summary = BatchSummary {
        total: asins.len(),
        successful: successful.len(),
        failed: failed.len(),
    };

    Ok(OptimizeBatchReport {
        successful,
        failed,
        summary,
    })
}

/// Runs the four generation calls sequentially: title, bullets, description,
/// keywords. Every call waits on the shared rate gate first.
///
/// # Errors
///
/// Returns [`ListingError::Generation`] when any model call fails.
pub async fn run_generation(
    ctx: &OptimizeContext<'_>,
    product: &Product,
) -> Result<GeneratedCopy, ListingError> {
    let context = listing_context(product);

    let title = generate_field(ctx, &title_prompt(product, &context)).await?;
    let title = clean_title(&title);

    let bullets = generate_field(ctx, &bullets_prompt(product)).await?;
    let description = generate_field(ctx, &description_prompt(product)).await?;

    let keywords_text = generate_field(ctx, &keywords_prompt(product, &context)).await?;
    let keywords = split_keywords(&keywords_text);

    Ok(GeneratedCopy {
        title,
        bullets,
        description,
        keywords,
    })
}

/// Issues a single model call for one field, honoring the rate limiter.
async fn generate_field(
    ctx: &OptimizeContext<'_>,
    prompt: &str,
) -> Result<String, ListingError> {
    let messages = vec![ChatMessage::user().content(prompt).build()];

    if let Some(limiter) = ctx.rate_limiter {
        loop {
            match limiter.try_acquire(1) {
                Ok(()) => break,
                Err(_) => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    let response = ctx
        .model
        .chat(&messages)
        .await
        .map_err(|err| ListingError::Generation(format!("model call failed: {err}")))?
        .to_string();

    Ok(THINK_STRIPPER_REGEX
        .replace_all(&response, "")
        .trim()
        .to_owned())
}

fn title_prompt(product: &Product, context: &str) -> String {
    TITLE_PROMPT_TEMPLATE
        .replace("{title}", &product.title)
        .replace("{context}", context)
}

fn bullets_prompt(product: &Product) -> String {
    BULLETS_PROMPT_TEMPLATE
        .replace("{title}", &product.title)
        .replace("{bullets}", product.bullet_text.as_deref().unwrap_or("(none)"))
}

fn description_prompt(product: &Product) -> String {
    DESCRIPTION_PROMPT_TEMPLATE
        .replace("{title}", &product.title)
        .replace(
            "{description}",
            product.description.as_deref().unwrap_or("(none)"),
        )
}

fn keywords_prompt(product: &Product, context: &str) -> String {
    KEYWORDS_PROMPT_TEMPLATE
        .replace("{title}", &product.title)
        .replace("{context}", context)
}

/// One-line summary of the stored listing facts fed to the model alongside
/// the field being rewritten.
fn listing_context(product: &Product) -> String {
    let mut pieces = Vec::new();

    if let Some(price) = &product.price {
        pieces.push(format!("price {price}"));
    }

    pieces.push(format!("availability {}", product.availability));

    if let Some(rating) = product.rating {
        pieces.push(format!("rated {rating} out of 5"));
    }

    if let Some(count) = product.review_count {
        pieces.push(format!("{count} customer reviews"));
    }

    pieces.join(", ")
}

/// Models occasionally wrap the rewritten title in quotes despite the prompt.
fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|ch| ch == '"' || ch == '\'')
        .trim()
        .to_string()
}

/// Splits a comma-separated keyword response, dropping empties and anything
/// past the keyword cap.
fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .take(MAX_KEYWORDS)
        .collect()
}

/// Records keyword observations after the optimization has committed. A
/// failed observation is logged and never fails the optimize call.
fn record_keywords(storage: &Storage, asin: &str, keywords: &[String]) {
    for keyword in keywords {
        if let Err(err) = storage.upsert_keyword(asin, keyword, KEYWORD_SOURCE_SUGGESTED) {
            warn!("Failed to record keyword observation {keyword} for ASIN {asin}: {err}");
        }
    }
}

/// Rehydrates a stored optimization into the response shape. The factor list
/// is recomputed; scoring is deterministic, so it matches the stored score.
fn cached_result(product: Product, stored: Optimization) -> OptimizationResult {
    let keywords = parse_stored_keywords(Some(&stored.generated_keywords));

    let generated = GeneratedCopy {
        title: stored.generated_title.clone(),
        bullets: stored.generated_bullets.clone(),
        description: stored.generated_description.clone(),
        keywords: keywords.clone(),
    };
    let breakdown = score_generation(&product, &generated);

    OptimizationResult {
        provenance: Provenance::Cached,
        id: stored.id,
        asin: stored.asin,
        original: product,
        generated_title: stored.generated_title,
        generated_bullets: stored.generated_bullets,
        generated_description: stored.generated_description,
        generated_keywords: keywords,
        score: stored.score,
        factors: breakdown.factors,
        model: stored.model,
        elapsed_ms: stored.elapsed_ms,
        call_count: stored.call_count,
        created_at: stored.created_at,
    }
}

fn fresh_result(
    id: i64,
    product: Product,
    generated: GeneratedCopy,
    breakdown: ScoreBreakdown,
    model_name: &str,
    elapsed_ms: u64,
    created_at: DateTime<Utc>,
) -> OptimizationResult {
    OptimizationResult {
        provenance: Provenance::Fresh,
        id,
        asin: product.asin.clone(),
        original: product,
        generated_title: generated.title,
        generated_bullets: generated.bullets,
        generated_description: generated.description,
        generated_keywords: generated.keywords,
        score: breakdown.score,
        factors: breakdown.factors,
        model: model_name.to_string(),
        elapsed_ms,
        call_count: GENERATION_CALLS,
        created_at,
    }
}
