use chrono::Utc;
use listlift::optimize::GeneratedCopy;
use listlift::score::{
    FACTOR_BULLETS, FACTOR_DESCRIPTION, FACTOR_KEYWORDS, FACTOR_TITLE, score_generation,
};
use listlift::storage::Product;
use spectral::assert_that;

fn product(title: &str, bullet_text: Option<&str>, description: Option<&str>) -> Product {
    Product {
        asin: "B08N5WRWNW".to_owned(),
        title: title.to_owned(),
        bullet_text: bullet_text.map(str::to_owned),
        description: description.map(str::to_owned),
        image_url: None,
        price: None,
        availability: "In Stock".to_owned(),
        rating: None,
        review_count: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn generated(title: &str, bullets: &str, description: &str, keywords: &[&str]) -> GeneratedCopy {
    GeneratedCopy {
        title: title.to_owned(),
        bullets: bullets.to_owned(),
        description: description.to_owned(),
        keywords: keywords.iter().map(|keyword| (*keyword).to_owned()).collect(),
    }
}

#[test]
fn all_factors_reach_full_score() {
    let original = product("Kettle", Some("• boils water"), Some("A kettle."));
    let improved = generated(
        "Electric Kettle with Rapid Boil and Auto Shutoff",
        "• boils water fast\n• shuts off automatically",
        "A stainless steel electric kettle with rapid boil.",
        &["electric kettle", "rapid boil", "auto shutoff"],
    );

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(100);
    assert_that(&breakdown.factors).is_equal_to(vec![
        FACTOR_TITLE,
        FACTOR_BULLETS,
        FACTOR_DESCRIPTION,
        FACTOR_KEYWORDS,
    ]);
}

#[test]
fn oversized_title_earns_nothing() {
    let original = product("Kettle", None, None);
    let improved = generated(&"K".repeat(201), "", "", &[]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(0);
    assert_that(&breakdown.factors.is_empty()).is_equal_to(true);
}

#[test]
fn title_at_the_character_cap_still_counts() {
    let original = product("Kettle", None, None);
    let improved = generated(&"K".repeat(200), "", "", &[]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(20);
    assert_that(&breakdown.factors).is_equal_to(vec![FACTOR_TITLE]);
}

#[test]
fn missing_original_bullets_count_as_empty() {
    let original = product("Kettle", None, None);
    let improved = generated("", "• any bullet at all", "", &[]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(25);
    assert_that(&breakdown.factors).is_equal_to(vec![FACTOR_BULLETS]);
}

#[test]
fn two_keywords_are_not_a_strategy() {
    let original = product("Kettle", None, None);
    let improved = generated("", "", "", &["kettle", "electric"]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(0);
}

#[test]
fn equal_lengths_earn_nothing() {
    let original = product("Kettle", Some("bullets"), Some("words"));
    let improved = generated("Kettle", "bullets", "words", &[]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(0);
    assert_that(&breakdown.factors.is_empty()).is_equal_to(true);
}

#[test]
fn a_one_character_gain_scores_like_any_other() {
    let original = product("Kettle", None, Some("words"));
    let improved = generated("", "", "words!", &[]);

    let breakdown = score_generation(&original, &improved);

    assert_that(&breakdown.score).is_equal_to(25);
    assert_that(&breakdown.factors).is_equal_to(vec![FACTOR_DESCRIPTION]);
}

#[test]
fn identical_inputs_yield_identical_breakdowns() {
    let original = product("Kettle", Some("• boils"), Some("A kettle."));
    let improved = generated(
        "A Much Better Kettle Title",
        "• boils water quickly",
        "A kettle you will enjoy.",
        &["kettle", "electric", "fast"],
    );

    let first = score_generation(&original, &improved);
    let second = score_generation(&original, &improved);

    assert_that(&first).is_equal_to(second);
}
