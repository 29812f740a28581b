use chrono::Utc;
use listlift::extract::ListingCandidate;
use listlift::keywords::encode_keywords;
use listlift::storage::{HistoryFilters, NewOptimization, Storage};
use spectral::assert_that;

fn memory_storage() -> Storage {
    Storage::new(":memory:").expect("Expected an in-memory database.")
}

fn candidate(title: &str) -> ListingCandidate {
    ListingCandidate {
        title: title.to_owned(),
        bullet_text: Some("• boils water fast".to_owned()),
        description: Some("A kettle.".to_owned()),
        image_url: None,
        price: Some("$29.99".to_owned()),
        availability: "In Stock".to_owned(),
        rating: Some(4.5),
        review_count: Some(120),
    }
}

fn insert_optimization(storage: &Storage, asin: &str, score: u8, model: &str) -> i64 {
    let keywords = encode_keywords(&["kettle".to_owned(), "electric".to_owned()]);
    storage
        .insert_optimization(&NewOptimization {
            asin,
            generated_title: "A Better Kettle Title",
            generated_bullets: "• boils faster",
            generated_description: "A kettle you will enjoy.",
            generated_keywords: &keywords,
            score,
            model,
            elapsed_ms: 1200,
            call_count: 4,
            created_at: Utc::now(),
        })
        .expect("Expected the optimization to persist.")
}

#[test]
fn upsert_preserves_created_at_and_replaces_fields() {
    let storage = memory_storage();

    let first = storage
        .upsert_product("B08N5WRWNW", &candidate("Kettle"))
        .expect("Expected the first upsert to succeed.");
    let second = storage
        .upsert_product("B08N5WRWNW", &candidate("Electric Kettle"))
        .expect("Expected the second upsert to succeed.");

    assert_that(&second.created_at).is_equal_to(first.created_at);
    assert_that(&second.title).is_equal_to("Electric Kettle".to_owned());
}

#[test]
fn get_product_returns_none_for_unknown_asin() {
    let storage = memory_storage();

    let missing = storage
        .get_product("B000000000")
        .expect("Expected the read to succeed.");

    assert_that(&missing.is_none()).is_equal_to(true);
}

#[test]
fn list_products_paginates() {
    let storage = memory_storage();
    for asin in ["B000000001", "B000000002", "B000000003"] {
        storage
            .upsert_product(asin, &candidate("Kettle"))
            .expect("Expected the upsert to succeed.");
    }

    let (first_page, pagination) = storage
        .list_products(1, 2)
        .expect("Expected the first page.");

    assert_that(&first_page.len()).is_equal_to(2);
    assert_that(&pagination.total_count).is_equal_to(3);
    assert_that(&pagination.total_pages).is_equal_to(2);
    assert_that(&pagination.has_next).is_equal_to(true);
    assert_that(&pagination.has_prev).is_equal_to(false);

    let (second_page, pagination) = storage
        .list_products(2, 2)
        .expect("Expected the second page.");

    assert_that(&second_page.len()).is_equal_to(1);
    assert_that(&pagination.has_next).is_equal_to(false);
    assert_that(&pagination.has_prev).is_equal_to(true);
}

#[test]
fn insert_optimization_records_a_created_action() {
    let storage = memory_storage();

    let id = insert_optimization(&storage, "B08N5WRWNW", 75, "ollama://llama3");

    let actions = storage
        .actions_for(id)
        .expect("Expected the action trail.");
    assert_that(&actions.len()).is_equal_to(1);
    let action = actions.first().expect("Expected one action.");
    assert_that(&action.action_type).is_equal_to("created".to_owned());
    assert_that(&action.payload.is_none()).is_equal_to(true);
}

#[test]
fn latest_optimization_returns_the_most_recent_row() {
    let storage = memory_storage();
    insert_optimization(&storage, "B08N5WRWNW", 50, "ollama://llama3");
    let newest = insert_optimization(&storage, "B08N5WRWNW", 75, "ollama://llama3");

    let latest = storage
        .latest_optimization("B08N5WRWNW")
        .expect("Expected the read to succeed.")
        .expect("Expected a stored optimization.");

    assert_that(&latest.id).is_equal_to(newest);
    assert_that(&latest.score).is_equal_to(75);
}

#[test]
fn keyword_upserts_deduplicate_per_asin() {
    let storage = memory_storage();
    storage
        .upsert_keyword("B08N5WRWNW", "kettle", "suggested")
        .expect("Expected the first write to succeed.");
    storage
        .upsert_keyword("B08N5WRWNW", "kettle", "suggested")
        .expect("Expected the second write to succeed.");
    storage
        .upsert_keyword("B000000001", "kettle", "suggested")
        .expect("Expected the third write to succeed.");

    let top = storage
        .top_keywords(0, 10)
        .expect("Expected keyword counts.");

    assert_that(&top.len()).is_equal_to(1);
    let entry = top.first().expect("Expected one keyword.");
    assert_that(&entry.keyword).is_equal_to("kettle".to_owned());
    assert_that(&entry.observations).is_equal_to(2);
}

#[test]
fn search_history_filters_by_score_and_model() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 30, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 80, "ollama://llama3");
    insert_optimization(&storage, "B000000003", 90, "openai://gpt-4o-mini");

    let filters = HistoryFilters {
        min_score: Some(60),
        model: Some("ollama://llama3".to_owned()),
        ..HistoryFilters::default()
    };
    let (matches, pagination) = storage
        .search_history(&filters, 1, 20)
        .expect("Expected the search to succeed.");

    assert_that(&matches.len()).is_equal_to(1);
    let only = matches.first().expect("Expected one match.");
    assert_that(&only.asin).is_equal_to("B000000002".to_owned());
    assert_that(&pagination.total_count).is_equal_to(1);
}

#[test]
fn search_history_without_filters_returns_everything() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 30, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 80, "ollama://llama3");

    let (matches, _) = storage
        .search_history(&HistoryFilters::default(), 1, 20)
        .expect("Expected the search to succeed.");

    assert_that(&matches.len()).is_equal_to(2);
}

#[test]
fn score_distribution_buckets_by_edges() {
    let storage = memory_storage();
    for (asin, score) in [
        ("B000000001", 80_u8),
        ("B000000002", 79),
        ("B000000003", 60),
        ("B000000004", 59),
        ("B000000005", 40),
        ("B000000006", 39),
    ] {
        insert_optimization(&storage, asin, score, "ollama://llama3");
    }

    let distribution = storage
        .score_distribution(0)
        .expect("Expected the distribution.");

    assert_that(&distribution.excellent).is_equal_to(1);
    assert_that(&distribution.good).is_equal_to(2);
    assert_that(&distribution.average).is_equal_to(2);
    assert_that(&distribution.poor).is_equal_to(1);
}

#[test]
fn score_distribution_is_zero_on_an_empty_database() {
    let storage = memory_storage();

    let distribution = storage
        .score_distribution(0)
        .expect("Expected the distribution.");

    assert_that(&distribution.excellent).is_equal_to(0);
    assert_that(&distribution.poor).is_equal_to(0);
}

#[test]
fn appended_action_payload_round_trips_as_json() {
    let storage = memory_storage();
    let id = insert_optimization(&storage, "B08N5WRWNW", 75, "ollama://llama3");

    storage
        .append_action("B08N5WRWNW", id, "feedback", Some(r#"{"rating":5}"#))
        .expect("Expected the action to persist.");

    let actions = storage
        .actions_for(id)
        .expect("Expected the action trail.");
    assert_that(&actions.len()).is_equal_to(2);
    let feedback = actions.last().expect("Expected the feedback action.");
    assert_that(&feedback.action_type).is_equal_to("feedback".to_owned());
    assert_that(&feedback.payload).is_equal_to(Some(serde_json::json!({"rating": 5})));
}

#[test]
fn daily_counts_cover_inserted_rows() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 60, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 80, "ollama://llama3");

    let days = storage.daily_counts(0).expect("Expected daily counts.");

    assert_that(&days.len()).is_equal_to(1);
    let today = days.first().expect("Expected one day.");
    assert_that(&today.count).is_equal_to(2);
    assert_that(&today.average_score).is_equal_to(Some(70.0));
}

#[test]
fn top_performing_asins_order_by_average_score() {
    let storage = memory_storage();
    insert_optimization(&storage, "B000000001", 40, "ollama://llama3");
    insert_optimization(&storage, "B000000002", 90, "ollama://llama3");

    let top = storage
        .top_performing_asins(0, 10)
        .expect("Expected the ranking.");

    assert_that(&top.len()).is_equal_to(2);
    let best = top.first().expect("Expected a best performer.");
    assert_that(&best.asin).is_equal_to("B000000002".to_owned());
}
