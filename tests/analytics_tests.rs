use chrono::Utc;
use listlift::storage::{NewOptimization, Storage};
use listlift::{stats, trends};
use spectral::assert_that;

fn memory_storage() -> Storage {
    Storage::new(":memory:").expect("Expected an in-memory database.")
}

fn insert_optimization(storage: &Storage, asin: &str, score: u8, model: &str) {
    storage
        .insert_optimization(&NewOptimization {
            asin,
            generated_title: "A Better Kettle Title",
            generated_bullets: "• boils faster",
            generated_description: "A kettle you will enjoy.",
            generated_keywords: "[]",
            score,
            model,
            elapsed_ms: 1200,
            call_count: 4,
            created_at: Utc::now(),
        })
        .expect("Expected the optimization to persist.");
}

#[test]
fn stats_cover_the_thirty_day_window() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 80, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 60, "openai://gpt-4o-mini");
    storage
        .upsert_keyword("B000000001", "kettle", "suggested")
        .expect("Expected the keyword to persist.");

    let report = stats(&storage).expect("Expected a stats report.");

    assert_that(&report.window_days).is_equal_to(30);
    assert_that(&report.model_usage.len()).is_equal_to(2);
    assert_that(&report.top_keywords.len()).is_equal_to(1);
    let today = report.daily_counts.first().expect("Expected one day.");
    assert_that(&today.count).is_equal_to(2);
}

#[test]
fn trends_report_buckets_and_rankings() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 85, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 35, "ollama://llama3");

    let report = trends(&storage, 7).expect("Expected a trends report.");

    assert_that(&report.window_days).is_equal_to(7);
    assert_that(&report.score_distribution.excellent).is_equal_to(1);
    assert_that(&report.score_distribution.poor).is_equal_to(1);
    assert_that(&report.top_performing_asins.len()).is_equal_to(2);
    let best = report
        .top_performing_asins
        .first()
        .expect("Expected a best performer.");
    assert_that(&best.asin).is_equal_to("B000000001".to_owned());
}

#[test]
fn trends_reject_an_empty_window() {
    let storage = memory_storage();

    let error = trends(&storage, 0).expect_err("Expected a rejection.");

    assert_that(&error.kind()).is_equal_to("INVALID_REQUEST");
}

#[test]
fn reports_are_empty_on_a_fresh_database() {
    let storage = memory_storage();

    let report = stats(&storage).expect("Expected a stats report.");

    assert_that(&report.daily_counts.is_empty()).is_equal_to(true);
    assert_that(&report.model_usage.is_empty()).is_equal_to(true);
    assert_that(&report.top_keywords.is_empty()).is_equal_to(true);
}
