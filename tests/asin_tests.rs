use listlift::ListingError;
use listlift::asin::{is_valid_asin, require_valid};
use spectral::assert_that;

#[test]
fn accepts_ten_uppercase_alphanumerics() {
    assert_that(&is_valid_asin("B08N5WRWNW")).is_equal_to(true);
    assert_that(&is_valid_asin("0123456789")).is_equal_to(true);
}

#[test]
fn rejects_lowercase() {
    assert_that(&is_valid_asin("b08n5wrwnw")).is_equal_to(false);
}

#[test]
fn rejects_wrong_length() {
    assert_that(&is_valid_asin("")).is_equal_to(false);
    assert_that(&is_valid_asin("B08N5WRWN")).is_equal_to(false);
    assert_that(&is_valid_asin("B08N5WRWNW1")).is_equal_to(false);
}

#[test]
fn rejects_punctuation_and_whitespace() {
    assert_that(&is_valid_asin("B08N5-RWNW")).is_equal_to(false);
    assert_that(&is_valid_asin("B08N5 RWNW")).is_equal_to(false);
}

#[test]
fn rejects_non_ascii() {
    assert_that(&is_valid_asin("B08N5WRWNÉ")).is_equal_to(false);
}

#[test]
fn require_valid_passes_well_formed_tokens() {
    assert_that(&require_valid("B08N5WRWNW").is_ok()).is_equal_to(true);
}

#[test]
fn require_valid_reports_invalid_asin_kind() {
    let error = require_valid("not-an-asin").expect_err("Expected a validation error.");

    assert_that(&error.kind()).is_equal_to("INVALID_ASIN");
    assert_that(&matches!(error, ListingError::InvalidAsin(_))).is_equal_to(true);
}
