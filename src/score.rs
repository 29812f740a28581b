//! Deterministic scoring of a generation against the original listing.

use serde::Serialize;

use crate::optimize::GeneratedCopy;
use crate::storage::Product;

pub const FACTOR_TITLE: &str = "Enhanced title length";
pub const FACTOR_BULLETS: &str = "Improved bullet points";
pub const FACTOR_DESCRIPTION: &str = "Enhanced description";
pub const FACTOR_KEYWORDS: &str = "Added keyword strategy";

const MAX_TITLE_CHARS: usize = 200;
const MIN_KEYWORD_COUNT: usize = 3;

/// Score plus the ordered list of factors that contributed to it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub factors: Vec<&'static str>,
}

/// Additive point system, capped at 100, no negative contributions.
///
/// Each factor fires on any improvement regardless of magnitude; a one
/// character gain scores the same as a hundred. Factors are evaluated in a
/// fixed order so identical inputs always yield an identical breakdown.
pub fn score_generation(original: &Product, generated: &GeneratedCopy) -> ScoreBreakdown {
    let mut score: u32 = 0;
    let mut factors = Vec::new();

    let generated_title_chars = generated.title.chars().count();
    if generated_title_chars > original.title.chars().count()
        && generated_title_chars <= MAX_TITLE_CHARS
    {
        score += 20;
        factors.push(FACTOR_TITLE);
    }

    if generated.bullets.len() > original.bullet_text.as_deref().unwrap_or_default().len() {
        score += 25;
        factors.push(FACTOR_BULLETS);
    }

    if generated.description.len() > original.description.as_deref().unwrap_or_default().len() {
        score += 25;
        factors.push(FACTOR_DESCRIPTION);
    }

    if generated.keywords.len() >= MIN_KEYWORD_COUNT {
        score += 30;
        factors.push(FACTOR_KEYWORDS);
    }

    ScoreBreakdown {
        score: score.min(100) as u8,
        factors,
    }
}
