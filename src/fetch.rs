//! Fetching of product detail pages and the 24 hour product cache gate.
//!
//! A fetch either yields a parseable page or a classified failure. There is no
//! anti-bot evasion: blocked responses surface as extraction failures and the
//! caller decides whether to retry later.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::asin::require_valid;
use crate::constants::{FETCH_TIMEOUT_SECS, MAX_FETCH_BATCH, PRODUCT_PAGE_URL, USER_AGENT};
use crate::error::ListingError;
use crate::extract::extract_listing;
use crate::freshness::{FreshnessKind, Provenance, is_fresh};
use crate::storage::{Product, Storage};

/// Builds the HTTP client shared by every fetch in the process.
///
/// # Errors
///
/// Returns an error when the TLS backend cannot be initialized.
pub fn build_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// A product response, stamped with where the data came from.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub provenance: Provenance,
    pub product: Product,
}

/// Fetches a product listing, serving the stored row when it is younger than
/// 24 hours.
///
/// # Errors
///
/// Returns an error if:
/// * The ASIN is malformed (`InvalidAsin`)
/// * The listing does not exist upstream (`NotFound`)
/// * The page cannot be reached or times out (`Unreachable`, `Timeout`)
/// * No usable listing can be extracted (`Extraction`)
/// * Database operations fail (`Store`)
pub async fn fetch_product(
    storage: &Storage,
    client: &Client,
    asin: &str,
    force: bool,
) -> Result<FetchResponse, ListingError> {
    require_valid(asin)?;

    if !force
        && let Some(stored) = storage.get_product(asin)?
        && is_fresh(stored.updated_at, FreshnessKind::FetchedProduct, Utc::now())
    {
        info!("Serving stored product for ASIN {asin}");
        return Ok(FetchResponse {
            provenance: Provenance::Cached,
            product: stored,
        });
    }

    info!("Fetching listing page for ASIN {asin}");

    let html = fetch_listing_html(client, asin).await?;
    let candidate = extract_listing(&html)?;
    let product = storage.upsert_product(asin, &candidate)?;

    debug!("Stored product {} titled {:?}", product.asin, product.title);

    Ok(FetchResponse {
        provenance: Provenance::Fresh,
        product,
    })
}

/// Downloads the raw detail page HTML for one ASIN.
///
/// # Errors
///
/// * 404 → [`ListingError::NotFound`]
/// * other non-success statuses → [`ListingError::Extraction`], covering
///   captcha interstitials and throttling pages
/// * transport failures → [`ListingError::Timeout`] or
///   [`ListingError::Unreachable`]
pub async fn fetch_listing_html(client: &Client, asin: &str) -> Result<String, ListingError> {
    let url = format!("{PRODUCT_PAGE_URL}{asin}");

    let response = client
        .get(&url)
        .header("accept-language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(classify_transport)?;

    match response.status() {
        StatusCode::NOT_FOUND => Err(ListingError::NotFound(format!(
            "no listing exists for ASIN {asin}"
        ))),
        status if !status.is_success() => Err(ListingError::Extraction(format!(
            "listing page for ASIN {asin} answered {status}; the request was likely blocked"
        ))),
        _ => response.text().await.map_err(classify_transport),
    }
}

fn classify_transport(err: reqwest::Error) -> ListingError {
    if err.is_timeout() {
        ListingError::Timeout(err)
    } else {
        ListingError::Unreachable(err)
    }
}

/// Report of a batch fetch run. Failed items never abort the batch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchBatchReport {
    pub items: Vec<BatchFetchItem>,
    pub summary: FetchBatchSummary,
}

/// One per-ASIN outcome inside a batch fetch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFetchItem {
    pub asin: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FetchResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchBatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Fetches up to ten listings strictly sequentially, pausing `delay_ms`
/// between consecutive requests. Each item goes through the same freshness
/// gate as the single-record path; a failed item is reported in place and its
/// siblings proceed.
///
/// # Errors
///
/// Returns `InvalidRequest` when the batch is empty or exceeds the batch
/// limit. Per-item failures are reported inside the result instead.
pub async fn fetch_products_batch(
    storage: &Storage,
    client: &Client,
    asins: &[String],
    force: bool,
    delay_ms: u64,
) -> Result<FetchBatchReport, ListingError> {
    if asins.is_empty() {
        return Err(ListingError::InvalidRequest(
            "fetch batch requires at least one ASIN".to_string(),
        ));
    }

    if asins.len() > MAX_FETCH_BATCH {
        return Err(ListingError::InvalidRequest(format!(
            "fetch batch accepts at most {MAX_FETCH_BATCH} ASINs, got {}",
            asins.len()
        )));
    }

    let mut items = Vec::with_capacity(asins.len());
    let mut successful = 0;

    for (index, asin) in asins.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match fetch_product(storage, client, asin, force).await {
            Ok(response) => {
                successful += 1;
                items.push(BatchFetchItem {
                    asin: asin.clone(),
                    success: true,
                    data: Some(response),
                    error: None,
                    kind: None,
                });
            }
            Err(err) => {
                warn!("Batch fetch failed for ASIN {asin}: {err}");
                items.push(BatchFetchItem {
                    asin: asin.clone(),
                    success: false,
                    data: None,
                    error: Some(err.to_string()),
                    kind: Some(err.kind()),
                });
            }
        }
    }

    let summary = FetchBatchSummary {
        total: asins.len(),
        successful,
        failed: asins.len() - successful,
    };

    Ok(FetchBatchReport { items, summary })
}
