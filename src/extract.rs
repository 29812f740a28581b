//! Structured extraction of listing fields from a product detail page.
//!
//! Every field has a ranked list of extraction rules, evaluated in order with
//! first-success-wins: a rule either yields a non-empty, trimmed, plausible
//! value or the next rule runs. Partial results from different rules are never
//! merged. Only the title is mandatory; a page without a usable title is
//! classified as blocked or unknown-layout and reported as an extraction
//! failure.

use dom_smoothie::{Article, CandidateSelectMode, Config, Readability, TextMode};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::constants::{BULLET_BOILERPLATE, MIN_BULLET_LEN, MIN_TITLE_LEN};
use crate::error::ListingError;

fn compile_rules(rules: &[&str]) -> Vec<Selector> {
    rules
        .iter()
        .map(|rule| Selector::parse(rule).expect("Failed to compile field selector"))
        .collect()
}

static TITLE_RULES: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_rules(&["#productTitle", "#title span", ".product-title-word-break"])
});

static BULLET_RULES: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_rules(&[
        "#feature-bullets ul li span.a-list-item",
        "#featurebullets_feature_div li",
    ])
});

static DESCRIPTION_RULES: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_rules(&["#productDescription", "#aplus_feature_div"]));

static IMAGE_RULES: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_rules(&["#landingImage", "#imgTagWrapperId img", "#main-image"]));

static PRICE_RULES: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_rules(&[
        "#corePrice_feature_div .a-price .a-offscreen",
        "#priceblock_ourprice",
        "#priceblock_dealprice",
        ".a-price .a-offscreen",
    ])
});

static AVAILABILITY_RULES: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_rules(&["#availability span", "#outOfStock span", ".a-color-success"]));

static RATING_RULES: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_rules(&["#acrPopover span.a-icon-alt", ".a-icon-star span.a-icon-alt"])
});

static REVIEW_COUNT_RULES: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_rules(&["#acrCustomerReviewText", "#acrCustomerReviewLink span"]));

static RATING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s+out of\s+5").expect("Failed to compile RATING_REGEX")
});

static REVIEW_COUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,.]*").expect("Failed to compile REVIEW_COUNT_REGEX"));

/// Transient, unowned candidate produced by extraction. Ownership of the
/// durable record belongs to the storage layer.
#[derive(Clone, PartialEq, Debug)]
pub struct ListingCandidate {
    pub title: String,
    pub bullet_text: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    /// Always present; "Unknown" when no rule matched.
    pub availability: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
}

/// Extracts a structured listing candidate from raw page HTML.
///
/// # Errors
///
/// Returns [`ListingError::Extraction`] when no rule produces a title of
/// plausible length, which is how blocked responses and unknown layouts
/// surface after a successful fetch.
pub fn extract_listing(html: &str) -> Result<ListingCandidate, ListingError> {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLE_RULES)
        .filter(|title| title.chars().count() >= MIN_TITLE_LEN)
        .ok_or_else(|| {
            ListingError::Extraction(
                "no usable product title; the page is blocked or uses an unknown layout"
                    .to_string(),
            )
        })?;

    Ok(ListingCandidate {
        title,
        bullet_text: extract_bullets(&document),
        description: extract_description(&document, html),
        image_url: first_attr(&document, &IMAGE_RULES, "src"),
        price: first_text(&document, &PRICE_RULES),
        availability: first_text(&document, &AVAILABILITY_RULES)
            .unwrap_or_else(|| "Unknown".to_string()),
        rating: extract_rating(&document),
        review_count: extract_review_count(&document),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First rule whose first match carries non-empty text wins.
fn first_text(document: &Html, rules: &[Selector]) -> Option<String> {
    for rule in rules {
        if let Some(element) = document.select(rule).next() {
            let text = element_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

fn first_attr(document: &Html, rules: &[Selector], attr: &str) -> Option<String> {
    for rule in rules {
        if let Some(value) = document
            .select(rule)
            .next()
            .and_then(|element| element.value().attr(attr))
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Collects bullet items under the primary rule, falling back to the
/// secondary rule only when the primary yields zero usable items.
fn extract_bullets(document: &Html) -> Option<String> {
    let items = BULLET_RULES
        .iter()
        .map(|rule| collect_bullet_items(document, rule))
        .find(|items| !items.is_empty())?;

    Some(
        items
            .iter()
            .map(|item| format!("• {item}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn collect_bullet_items(document: &Html, rule: &Selector) -> Vec<String> {
    document
        .select(rule)
        .map(element_text)
        .filter(|item| item.len() >= MIN_BULLET_LEN && !item.contains(BULLET_BOILERPLATE))
        .collect()
}

/// Description rules, then readability extraction over the whole document as
/// the last resort.
fn extract_description(document: &Html, html: &str) -> Option<String> {
    first_text(document, &DESCRIPTION_RULES).or_else(|| readability_text(html))
}

fn readability_text(html: &str) -> Option<String> {
    let config = Config {
        text_mode: TextMode::Markdown,
        candidate_select_mode: CandidateSelectMode::DomSmoothie,
        ..Default::default()
    };

    let mut readability = Readability::new(html, None, Some(config)).ok()?;
    let article: Article = readability.parse().ok()?;
    let text = article.text_content.trim().to_string();

    if text.is_empty() { None } else { Some(text) }
}

/// Pattern match over rating text such as "4.5 out of 5 stars".
/// Returns None on no match, never an error.
fn extract_rating(document: &Html) -> Option<f64> {
    for rule in RATING_RULES.iter() {
        for element in document.select(rule) {
            let text = element_text(element);
            if let Some(captures) = RATING_REGEX.captures(&text)
                && let Some(group) = captures.get(1)
                && let Ok(value) = group.as_str().replace(',', ".").parse::<f64>()
                && (0.0..=5.0).contains(&value)
            {
                return Some(value);
            }
        }
    }

    None
}

/// First digit group, thousands separators allowed, e.g. "1,234 ratings".
fn extract_review_count(document: &Html) -> Option<i64> {
    for rule in REVIEW_COUNT_RULES.iter() {
        for element in document.select(rule) {
            let text = element_text(element);
            if let Some(group) = REVIEW_COUNT_REGEX.find(&text)
                && let Ok(value) = group
                    .as_str()
                    .replace([',', '.'], "")
                    .parse::<i64>()
                && value >= 0
            {
                return Some(value);
            }
        }
    }

    None
}
