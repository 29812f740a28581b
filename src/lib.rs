//! The listlift library fetches Amazon product listings, generates optimized
//! listing copy through an LLM model and keeps every generation, score and
//! feedback event in a local SQLite database.

pub mod analytics;
pub mod asin;
pub mod constants;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod freshness;
pub mod history;
pub mod keywords;
pub mod optimize;
pub mod score;
pub mod storage;

pub use analytics::{stats, trends};
pub use asin::is_valid_asin;
pub use error::ListingError;
pub use fetch::{build_client, fetch_product, fetch_products_batch};
pub use freshness::Provenance;
pub use history::{history, history_filtered, submit_feedback};
pub use keywords::parse_stored_keywords;
pub use optimize::{optimize_batch, optimize_product};
pub use score::score_generation;
