//! listlift is a CLI tool that fetches Amazon product listings, generates
//! optimized listing copy using an LLM model and tracks every generation in a
//! local database.
//!
//! The tool has two main command families:
//! 1. `fetch` / `fetch-batch` / `list` - Fetch listings and store them locally
//! 2. `optimize` / `optimize-batch` / `history` / `stats` / `trends` /
//!    `feedback` - Generate optimized copy and report on stored generations

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use llm::builder::{LLMBackend, LLMBuilder};
use log::{LevelFilter, info};
use rate_guard::{StdTokenBucket, TokenBucketBuilder};
use serde::Serialize;
use url::Url;

use listlift::{
    constants::MODEL_API_KEY_ENV_NAME,
    fetch::{build_client, fetch_product, fetch_products_batch},
    history::{FeedbackInput, history, history_filtered, submit_feedback},
    optimize::{OptimizeContext, optimize_batch, optimize_product},
    stats,
    storage::{HistoryFilters, Storage},
    trends,
};

/// A CLI tool to optimize Amazon product listings with an LLM model
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a product listing and store it in a local database
    Fetch {
        /// Path to database file to store listing data
        db: String,
        /// The ASIN of the listing to fetch
        asin: String,
        /// Re-fetch even when a stored listing is younger than 24 hours
        #[arg(long, short)]
        force: bool,
    },
    /// Fetch up to 10 product listings sequentially
    FetchBatch {
        /// Path to database file to store listing data
        db: String,
        /// The ASINs of the listings to fetch
        asins: Vec<String>,
        /// Delay between requests in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
        /// Re-fetch even when a stored listing is younger than 24 hours
        #[arg(long, short)]
        force: bool,
    },
    /// List stored product listings, most recently updated first
    List {
        /// Path to database file to read listings from
        db: String,
        /// Page number, starting at 1
        #[arg(long, short, default_value_t = 1)]
        page: u32,
        /// Listings per page
        #[arg(long, short, default_value_t = 20)]
        limit: u32,
    },
    /// Generate optimized copy for a stored listing using an LLM model
    Optimize {
        /// Path to database file to read listings from
        db: String,
        /// The ASIN of the listing to optimize
        asin: String,
        /// URL of the LLM model to use for generation
        model: String,
        /// Regenerate even when a stored optimization is younger than 1 hour
        #[arg(long, short)]
        force: bool,
        /// Minimum interval between model calls in milliseconds (default: no limit)
        #[arg(long, short)]
        interval: Option<u64>,
    },
    /// Generate optimized copy for up to 5 stored listings sequentially
    OptimizeBatch {
        /// Path to database file to read listings from
        db: String,
        /// URL of the LLM model to use for generation
        model: String,
        /// The ASINs of the listings to optimize
        asins: Vec<String>,
        /// Delay between listings in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
        /// Regenerate even when a stored optimization is younger than 1 hour
        #[arg(long, short)]
        force: bool,
        /// Minimum interval between model calls in milliseconds (default: no limit)
        #[arg(long, short)]
        interval: Option<u64>,
    },
    /// Show the optimization history of one listing
    History {
        /// Path to database file to read optimizations from
        db: String,
        /// The ASIN of the listing
        asin: String,
        /// Page number, starting at 1
        #[arg(long, short, default_value_t = 1)]
        page: u32,
        /// Optimizations per page
        #[arg(long, short, default_value_t = 10)]
        limit: u32,
    },
    /// Search optimization history across all listings
    Search {
        /// Path to database file to read optimizations from
        db: String,
        /// Only optimizations on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Only optimizations on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// Only optimizations scoring at least this much
        #[arg(long)]
        min_score: Option<u8>,
        /// Only optimizations scoring at most this much
        #[arg(long)]
        max_score: Option<u8>,
        /// Only optimizations generated by this model
        #[arg(long, short)]
        model: Option<String>,
        /// Page number, starting at 1
        #[arg(long, short, default_value_t = 1)]
        page: u32,
        /// Optimizations per page
        #[arg(long, short, default_value_t = 20)]
        limit: u32,
    },
    /// Show 30-day usage statistics
    Stats {
        /// Path to database file to read optimizations from
        db: String,
    },
    /// Show performance trends over a chosen window
    Trends {
        /// Path to database file to read optimizations from
        db: String,
        /// Window size in days
        #[arg(long, short, default_value_t = 30)]
        days: u32,
    },
    /// Record feedback on a stored optimization
    Feedback {
        /// Path to database file to read optimizations from
        db: String,
        /// The id of the optimization the feedback is about
        optimization_id: i64,
        /// Star rating from 1 to 5
        #[arg(long, short)]
        rating: i64,
        /// Free-form comments
        #[arg(long, short)]
        comments: Option<String>,
        /// Whether the generated copy was helpful
        #[arg(long)]
        helpful: Option<bool>,
        /// What should be improved next time
        #[arg(long)]
        improvements: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Command::Fetch { db, asin, force } => {
            let storage = Storage::new(&db)?;
            let client = build_client()?;
            let response = fetch_product(&storage, &client, &asin, force).await?;
            print_json(&response)
        }
        Command::FetchBatch {
            db,
            asins,
            delay,
            force,
        } => {
            let storage = Storage::new(&db)?;
            let client = build_client()?;
            let report = fetch_products_batch(&storage, &client, &asins, force, delay).await?;
            print_json(&report)
        }
        Command::List { db, page, limit } => {
            let storage = Storage::new(&db)?;
            let (products, pagination) = storage.list_products(page, limit)?;
            print_json(&serde_json::json!({
                "products": products,
                "pagination": pagination,
            }))
        }
        Command::Optimize {
            db,
            asin,
            model,
            force,
            interval,
        } => {
            let storage = Storage::new(&db)?;
            let provider = build_llm(&model)?;
            let rate_limiter = build_rate_limiter(interval);
            let ctx = OptimizeContext {
                model: provider.as_ref(),
                model_name: &model,
                rate_limiter: rate_limiter.as_ref(),
            };
            let result = optimize_product(&storage, &ctx, &asin, force).await?;
            print_json(&result)
        }
        Command::OptimizeBatch {
            db,
            model,
            asins,
            delay,
            force,
            interval,
        } => {
            let storage = Storage::new(&db)?;
            let provider = build_llm(&model)?;
            let rate_limiter = build_rate_limiter(interval);
            let ctx = OptimizeContext {
                model: provider.as_ref(),
                model_name: &model,
                rate_limiter: rate_limiter.as_ref(),
            };
            let report = optimize_batch(&storage, &ctx, &asins, force, delay).await?;
            print_json(&report)
        }
        Command::History {
            db,
            asin,
            page,
            limit,
        } => {
            let storage = Storage::new(&db)?;
            let report = history(&storage, &asin, page, limit)?;
            print_json(&report)
        }
        Command::Search {
            db,
            start_date,
            end_date,
            min_score,
            max_score,
            model,
            page,
            limit,
        } => {
            let storage = Storage::new(&db)?;
            let filters = HistoryFilters {
                start_date: parse_day(start_date.as_deref(), false)?,
                end_date: parse_day(end_date.as_deref(), true)?,
                min_score,
                max_score,
                model,
            };
            let report = history_filtered(&storage, &filters, page, limit)?;
            print_json(&report)
        }
        Command::Stats { db } => {
            let storage = Storage::new(&db)?;
            print_json(&stats(&storage)?)
        }
        Command::Trends { db, days } => {
            let storage = Storage::new(&db)?;
            print_json(&trends(&storage, days)?)
        }
        Command::Feedback {
            db,
            optimization_id,
            rating,
            comments,
            helpful,
            improvements,
        } => {
            let storage = Storage::new(&db)?;
            let ack = submit_feedback(
                &storage,
                optimization_id,
                &FeedbackInput {
                    rating,
                    comments,
                    helpful,
                    improvements,
                },
            )?;
            print_json(&ack)
        }
    }
}

/// Builds the LLM provider from a model URL such as `ollama://llama3` or
/// `openai://gpt-4o-mini`, picking up the API key from the environment.
fn build_llm(model: &str) -> Result<Box<dyn llm::chat::ChatProvider>> {
    let model_url = Url::parse(model).map_err(|e| anyhow::anyhow!("Invalid model URL: {}", e))?;
    let llm_builder = LLMBuilder::new()
        .backend(
            LLMBackend::from_str(model_url.scheme())
                .map_err(|e| anyhow::anyhow!("Invalid LLM backend: {}", e))?,
        )
        .model(
            [
                model_url
                    .host_str()
                    .context("Specify model name as host URL.")?,
                model_url.username(),
            ]
            .iter()
            .filter(|x| !x.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(":"),
        );

    let llm_builder = match std::env::var(MODEL_API_KEY_ENV_NAME) {
        Ok(model_key) => {
            info!("API KEY is provided");
            llm_builder.api_key(model_key)
        }
        Err(err) => {
            info!("{err} while providing api key");
            llm_builder
        }
    };

    llm_builder
        .build()
        .map(|provider| provider as Box<dyn llm::chat::ChatProvider>)
        .map_err(|e| anyhow::anyhow!("Failed to build LLM model: {}", e))
}

/// Builds a token bucket enforcing a minimum interval between model calls.
fn build_rate_limiter(interval_ms: Option<u64>) -> Option<StdTokenBucket> {
    interval_ms.filter(|ms| *ms > 0).and_then(|ms| {
        TokenBucketBuilder::builder()
            .capacity(1_u64)
            .refill_amount(1_u64)
            .refill_every(Duration::from_millis(ms))
            .with_time(rate_guard::StdTimeSource::new())
            .with_precision::<rate_guard::Nanos>()
            .build()
            .ok()
    })
}

/// Parses a `YYYY-MM-DD` CLI date, anchored to the start or end of that day.
fn parse_day(raw: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date {raw:?}: {e}"))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .context("Invalid time of day")?;

    Ok(Some(time.and_utc()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
