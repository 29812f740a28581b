use chrono::{Duration, Utc};
use listlift::freshness::{FreshnessKind, is_fresh};
use spectral::assert_that;

#[test]
fn fetched_product_is_fresh_within_a_day() {
    let last = Utc::now();
    let now = last + Duration::hours(23);

    assert_that(&is_fresh(last, FreshnessKind::FetchedProduct, now)).is_equal_to(true);
}

#[test]
fn fetched_product_goes_stale_after_a_day() {
    let last = Utc::now();

    assert_that(&is_fresh(
        last,
        FreshnessKind::FetchedProduct,
        last + Duration::hours(25),
    ))
    .is_equal_to(false);
}

#[test]
fn fetched_product_window_boundary_is_stale() {
    let last = Utc::now();

    assert_that(&is_fresh(
        last,
        FreshnessKind::FetchedProduct,
        last + Duration::hours(24),
    ))
    .is_equal_to(false);
}

#[test]
fn generation_is_fresh_within_an_hour() {
    let last = Utc::now();
    let now = last + Duration::minutes(59);

    assert_that(&is_fresh(last, FreshnessKind::Generated, now)).is_equal_to(true);
}

#[test]
fn generation_goes_stale_after_an_hour() {
    let last = Utc::now();

    assert_that(&is_fresh(
        last,
        FreshnessKind::Generated,
        last + Duration::minutes(61),
    ))
    .is_equal_to(false);
}

#[test]
fn generation_window_boundary_is_stale() {
    let last = Utc::now();

    assert_that(&is_fresh(
        last,
        FreshnessKind::Generated,
        last + Duration::minutes(60),
    ))
    .is_equal_to(false);
}
