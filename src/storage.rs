//! The storage module provides database operations for products, generation
//! events, the append-only action log and keyword observations using SQLite.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::constants::{MAX_HISTORY_LIMIT, MAX_LIST_LIMIT, MAX_SEARCH_LIMIT};
use crate::extract::ListingCandidate;

/// Storage provides database operations for the listing pipeline.
pub struct Storage {
    /// The underlying SQLite connection wrapped in Arc<Mutex<>> to make it thread-safe
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Creates a new Storage instance with a database at the specified path.
    /// `:memory:` is accepted for throwaway databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot
    /// be initialized.
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initializes the database schema if it doesn't exist.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS products (
                asin TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                bullet_text TEXT NULL,
                description TEXT NULL,
                image_url TEXT NULL,
                price TEXT NULL,
                availability TEXT NOT NULL DEFAULT 'Unknown',
                rating REAL NULL,
                review_count INTEGER NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS optimizations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asin TEXT NOT NULL REFERENCES products(asin) ON DELETE CASCADE,
                generated_title TEXT NOT NULL,
                generated_bullets TEXT NOT NULL,
                generated_description TEXT NOT NULL,
                generated_keywords TEXT NOT NULL,
                score INTEGER NOT NULL,
                model TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                call_count INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_optimizations_asin_created
                ON optimizations(asin, created_at DESC);
            CREATE TABLE IF NOT EXISTS actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asin TEXT NOT NULL,
                optimization_id INTEGER NOT NULL REFERENCES optimizations(id) ON DELETE CASCADE,
                action_type TEXT NOT NULL
                    CHECK (action_type IN ('created', 'updated', 'viewed', 'feedback')),
                payload TEXT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS keywords (
                asin TEXT NOT NULL,
                keyword TEXT NOT NULL,
                source TEXT NOT NULL CHECK (source IN ('original', 'suggested', 'manual')),
                relevance REAL NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (asin, keyword)
            );",
        )?;

        Ok(())
    }

    /// Inserts or updates the product row for an ASIN, refreshing every
    /// extracted field and the update timestamp while preserving the creation
    /// timestamp. Returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_product(&self, asin: &str, candidate: &ListingCandidate) -> Result<Product> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT INTO products (asin, title, bullet_text, description, image_url, price,
                                   availability, rating, review_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(asin) DO UPDATE SET
                title = excluded.title,
                bullet_text = excluded.bullet_text,
                description = excluded.description,
                image_url = excluded.image_url,
                price = excluded.price,
                availability = excluded.availability,
                rating = excluded.rating,
                review_count = excluded.review_count,
                updated_at = excluded.updated_at",
            params![
                asin,
                candidate.title,
                candidate.bullet_text,
                candidate.description,
                candidate.image_url,
                candidate.price,
                candidate.availability,
                candidate.rating,
                candidate.review_count,
                now,
            ],
        )?;

        Self::product_by_asin(&conn, asin)?
            .context("Product row vanished right after upsert")
    }

    /// Gets the product row for an ASIN.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_product(&self, asin: &str) -> Result<Option<Product>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        Self::product_by_asin(&conn, asin)
    }

    fn product_by_asin(conn: &Connection, asin: &str) -> Result<Option<Product>> {
        let mut stmt = conn.prepare(
            "SELECT asin, title, bullet_text, description, image_url, price, availability,
                    rating, review_count, created_at, updated_at
             FROM products WHERE asin = ?1",
        )?;
        let row: Option<ProductRow> = stmt
            .query_row([asin], product_row_mapper)
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch product row: {e}"))?;

        row.map(Product::try_from).transpose()
    }

    /// Lists stored products most-recently-updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_products(&self, page: u32, limit: u32) -> Result<(Vec<Product>, Pagination)> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let page = page.max(1);
        let conn = self.conn.lock().expect("Storage mutex poisoned");

        let total_count: u64 =
            conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT asin, title, bullet_text, description, image_url, price, availability,
                    rating, review_count, created_at, updated_at
             FROM products ORDER BY updated_at DESC, asin ASC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit, (page - 1) * limit], product_row_mapper)?;

        let products: Vec<Product> = rows
            .collect::<Result<Vec<ProductRow>, rusqlite::Error>>()?
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<_>>()?;

        Ok((products, Pagination::compute(total_count, page, limit)))
    }

    /// Inserts one optimization row and its `created` action entry in a
    /// single transaction, so a generation event is durably recorded exactly
    /// once with its triggering action. Returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn insert_optimization(&self, record: &NewOptimization<'_>) -> Result<i64> {
        let created_at = record.created_at.timestamp();
        let mut conn = self.conn.lock().expect("Storage mutex poisoned");
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO optimizations (asin, generated_title, generated_bullets,
                                        generated_description, generated_keywords, score,
                                        model, elapsed_ms, call_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.asin,
                record.generated_title,
                record.generated_bullets,
                record.generated_description,
                record.generated_keywords,
                record.score,
                record.model,
                record.elapsed_ms as i64,
                record.call_count,
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO actions (asin, optimization_id, action_type, payload, created_at)
             VALUES (?1, ?2, 'created', NULL, ?3)",
            params![record.asin, id, created_at],
        )?;

        tx.commit()?;
        Ok(id)
    }

    /// Gets the most recent optimization for an ASIN, for the freshness gate.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn latest_optimization(&self, asin: &str) -> Result<Option<Optimization>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTIMIZATION_COLUMNS} FROM optimizations
             WHERE asin = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"
        ))?;
        let row: Option<OptimizationRow> = stmt
            .query_row([asin], optimization_row_mapper)
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch optimization row: {e}"))?;

        row.map(Optimization::try_from).transpose()
    }

    /// Gets one optimization by id.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_optimization(&self, id: i64) -> Result<Option<Optimization>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTIMIZATION_COLUMNS} FROM optimizations WHERE id = ?1"
        ))?;
        let row: Option<OptimizationRow> = stmt
            .query_row([id], optimization_row_mapper)
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch optimization row: {e}"))?;

        row.map(Optimization::try_from).transpose()
    }

    /// Upserts one keyword observation. A duplicate (asin, keyword) pair
    /// collapses to a timestamp refresh instead of a new row.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_keyword(&self, asin: &str, keyword: &str, source: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT INTO keywords (asin, keyword, source, relevance, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?4)
             ON CONFLICT(asin, keyword) DO UPDATE SET
                source = excluded.source,
                updated_at = excluded.updated_at",
            params![asin, keyword, source, now],
        )?;

        Ok(())
    }

    /// Appends one action-log entry tied to an optimization.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn append_action(
        &self,
        asin: &str,
        optimization_id: i64,
        action_type: &str,
        payload: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT INTO actions (asin, optimization_id, action_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![asin, optimization_id, action_type, payload, now],
        )?;

        Ok(())
    }

    /// Gets the action-log entries for one optimization, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn actions_for(&self, optimization_id: i64) -> Result<Vec<ActionEntry>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT action_type, payload, created_at FROM actions
             WHERE optimization_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([optimization_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut actions = Vec::new();
        for row in rows {
            let (action_type, payload, created_at) = row?;
            actions.push(ActionEntry {
                action_type,
                payload: payload.map(|text| {
                    serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
                }),
                created_at: timestamp_to_datetime(created_at)?,
            });
        }

        Ok(actions)
    }

    /// Gets one page of optimizations for an ASIN, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn history(&self, asin: &str, page: u32, limit: u32) -> Result<(Vec<Optimization>, Pagination)> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let page = page.max(1);
        let conn = self.conn.lock().expect("Storage mutex poisoned");

        let total_count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM optimizations WHERE asin = ?1",
            [asin],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTIMIZATION_COLUMNS} FROM optimizations
             WHERE asin = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(
            params![asin, limit, (page - 1) * limit],
            optimization_row_mapper,
        )?;

        let optimizations = collect_optimizations(rows)?;
        Ok((optimizations, Pagination::compute(total_count, page, limit)))
    }

    /// Gets one page of optimizations matching the given filters, most recent
    /// first. The WHERE clause is assembled dynamically from whichever filters
    /// are present.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn search_history(
        &self,
        filters: &HistoryFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Optimization>, Pagination)> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let page = page.max(1);
        let (where_sql, mut bound) = filters.to_sql();
        let conn = self.conn.lock().expect("Storage mutex poisoned");

        let total_count: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM optimizations{where_sql}"),
            params_from_iter(bound.iter().map(|value| value.as_ref())),
            |row| row.get(0),
        )?;

        bound.push(Box::new(limit));
        bound.push(Box::new((page - 1) * limit));
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPTIMIZATION_COLUMNS} FROM optimizations{where_sql}
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(
            params_from_iter(bound.iter().map(|value| value.as_ref())),
            optimization_row_mapper,
        )?;

        let optimizations = collect_optimizations(rows)?;
        Ok((optimizations, Pagination::compute(total_count, page, limit)))
    }

    /// Daily optimization counts since the given unix timestamp, newest day first.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn daily_counts(&self, since: i64) -> Result<Vec<DailyCount>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT date(created_at, 'unixepoch') AS day, COUNT(*), AVG(score)
             FROM optimizations WHERE created_at >= ?1
             GROUP BY day ORDER BY day DESC",
        )?;
        let rows = stmt.query_map([since], |row| {
            Ok(DailyCount {
                day: row.get(0)?,
                count: row.get(1)?,
                average_score: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, rusqlite::Error>>()
            .map_err(|e| e.into())
    }

    /// Per-model usage counters since the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn model_usage(&self, since: i64) -> Result<Vec<ModelUsage>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT model, COUNT(*), AVG(score), AVG(elapsed_ms)
             FROM optimizations WHERE created_at >= ?1
             GROUP BY model ORDER BY COUNT(*) DESC, model ASC",
        )?;
        let rows = stmt.query_map([since], |row| {
            Ok(ModelUsage {
                model: row.get(0)?,
                count: row.get(1)?,
                average_score: row.get(2)?,
                average_elapsed_ms: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, rusqlite::Error>>()
            .map_err(|e| e.into())
    }

    /// Most-observed keywords since the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn top_keywords(&self, since: i64, limit: u32) -> Result<Vec<KeywordCount>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT keyword, COUNT(*) AS observations FROM keywords
             WHERE updated_at >= ?1
             GROUP BY keyword ORDER BY observations DESC, keyword ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![since, limit], |row| {
            Ok(KeywordCount {
                keyword: row.get(0)?,
                observations: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, rusqlite::Error>>()
            .map_err(|e| e.into())
    }

    /// Score bucket counts since the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn score_distribution(&self, since: i64) -> Result<ScoreDistribution> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.query_row(
            "SELECT
                SUM(CASE WHEN score >= 80 THEN 1 ELSE 0 END),
                SUM(CASE WHEN score >= 60 AND score < 80 THEN 1 ELSE 0 END),
                SUM(CASE WHEN score >= 40 AND score < 60 THEN 1 ELSE 0 END),
                SUM(CASE WHEN score < 40 THEN 1 ELSE 0 END)
             FROM optimizations WHERE created_at >= ?1",
            [since],
            |row| {
                Ok(ScoreDistribution {
                    excellent: row.get::<_, Option<u32>>(0)?.unwrap_or_default(),
                    good: row.get::<_, Option<u32>>(1)?.unwrap_or_default(),
                    average: row.get::<_, Option<u32>>(2)?.unwrap_or_default(),
                    poor: row.get::<_, Option<u32>>(3)?.unwrap_or_default(),
                })
            },
        )
        .map_err(|e| e.into())
    }

    /// ASINs with the highest average score since the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn top_performing_asins(&self, since: i64, limit: u32) -> Result<Vec<AsinPerformance>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT asin, AVG(score) AS average_score, COUNT(*)
             FROM optimizations WHERE created_at >= ?1
             GROUP BY asin ORDER BY average_score DESC, asin ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![since, limit], |row| {
            Ok(AsinPerformance {
                asin: row.get(0)?,
                average_score: row.get(1)?,
                count: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, rusqlite::Error>>()
            .map_err(|e| e.into())
    }
}

const OPTIMIZATION_COLUMNS: &str = "id, asin, generated_title, generated_bullets, \
     generated_description, generated_keywords, score, model, elapsed_ms, call_count, created_at";

fn product_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        asin: row.get(0)?,
        title: row.get(1)?,
        bullet_text: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        price: row.get(5)?,
        availability: row.get(6)?,
        rating: row.get(7)?,
        review_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn optimization_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<OptimizationRow> {
    Ok(OptimizationRow {
        id: row.get(0)?,
        asin: row.get(1)?,
        generated_title: row.get(2)?,
        generated_bullets: row.get(3)?,
        generated_description: row.get(4)?,
        generated_keywords: row.get(5)?,
        score: row.get(6)?,
        model: row.get(7)?,
        elapsed_ms: row.get(8)?,
        call_count: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn collect_optimizations(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<OptimizationRow>>,
) -> Result<Vec<Optimization>> {
    rows.collect::<Result<Vec<OptimizationRow>, rusqlite::Error>>()?
        .into_iter()
        .map(Optimization::try_from)
        .collect()
}

fn timestamp_to_datetime(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).context("Unable to convert stored timestamp")
}

/// Represents a product row as stored in the database
#[derive(Debug)]
pub struct ProductRow {
    pub asin: String,
    pub title: String,
    pub bullet_text: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub availability: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Represents a domain Product
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub asin: String,
    pub title: String,
    pub bullet_text: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub availability: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = anyhow::Error;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            asin: row.asin,
            title: row.title,
            bullet_text: row.bullet_text,
            description: row.description,
            image_url: row.image_url,
            price: row.price,
            availability: row.availability,
            rating: row.rating,
            review_count: row.review_count,
            created_at: timestamp_to_datetime(row.created_at)?,
            updated_at: timestamp_to_datetime(row.updated_at)?,
        })
    }
}

/// Represents an optimization row as stored in the database
#[derive(Debug)]
pub struct OptimizationRow {
    pub id: i64,
    pub asin: String,
    pub generated_title: String,
    pub generated_bullets: String,
    pub generated_description: String,
    pub generated_keywords: String,
    pub score: i64,
    pub model: String,
    pub elapsed_ms: i64,
    pub call_count: i64,
    pub created_at: i64,
}

/// Represents a domain generation event. `generated_keywords` keeps the raw
/// stored payload; readers decode it through the recovery parser.
#[derive(Clone, Debug)]
pub struct Optimization {
    pub id: i64,
    pub asin: String,
    pub generated_title: String,
    pub generated_bullets: String,
    pub generated_description: String,
    pub generated_keywords: String,
    pub score: u8,
    pub model: String,
    pub elapsed_ms: u64,
    pub call_count: u32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OptimizationRow> for Optimization {
    type Error = anyhow::Error;

    fn try_from(row: OptimizationRow) -> Result<Self> {
        Ok(Optimization {
            id: row.id,
            asin: row.asin,
            generated_title: row.generated_title,
            generated_bullets: row.generated_bullets,
            generated_description: row.generated_description,
            generated_keywords: row.generated_keywords,
            score: u8::try_from(row.score.clamp(0, 100)).context("Stored score out of range")?,
            model: row.model,
            elapsed_ms: u64::try_from(row.elapsed_ms.max(0))
                .context("Stored elapsed_ms out of range")?,
            call_count: u32::try_from(row.call_count.max(0))
                .context("Stored call_count out of range")?,
            created_at: timestamp_to_datetime(row.created_at)?,
        })
    }
}

/// A generation event about to be persisted.
#[derive(Debug)]
pub struct NewOptimization<'a> {
    pub asin: &'a str,
    pub generated_title: &'a str,
    pub generated_bullets: &'a str,
    pub generated_description: &'a str,
    /// Canonical JSON array encoding; see the keywords module.
    pub generated_keywords: &'a str,
    pub score: u8,
    pub model: &'a str,
    pub elapsed_ms: u64,
    pub call_count: u32,
    pub created_at: DateTime<Utc>,
}

/// One action-log entry as returned to callers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Page metadata for paginated reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    fn compute(total_count: u64, page: u32, limit: u32) -> Self {
        let total_pages = u32::try_from(total_count.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);

        Pagination {
            current_page: page,
            total_pages,
            total_count,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Optional filters for searching the optimization history.
#[derive(Clone, Debug, Default)]
pub struct HistoryFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_score: Option<u8>,
    pub max_score: Option<u8>,
    pub model: Option<String>,
}

impl HistoryFilters {
    fn to_sql(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(start) = self.start_date {
            clauses.push("created_at >= ?");
            bound.push(Box::new(start.timestamp()));
        }
        if let Some(end) = self.end_date {
            clauses.push("created_at <= ?");
            bound.push(Box::new(end.timestamp()));
        }
        if let Some(min_score) = self.min_score {
            clauses.push("score >= ?");
            bound.push(Box::new(min_score));
        }
        if let Some(max_score) = self.max_score {
            clauses.push("score <= ?");
            bound.push(Box::new(max_score));
        }
        if let Some(model) = &self.model {
            clauses.push("model = ?");
            bound.push(Box::new(model.clone()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        (where_sql, bound)
    }
}

/// One day of optimization activity.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: String,
    pub count: u32,
    pub average_score: Option<f64>,
}

/// Usage counters for one model.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    pub model: String,
    pub count: u32,
    pub average_score: Option<f64>,
    pub average_elapsed_ms: Option<f64>,
}

/// Observation count for one keyword.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCount {
    pub keyword: String,
    pub observations: u32,
}

/// Score bucket counters: Excellent >= 80, Good 60-79, Average 40-59, Poor < 40.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    pub excellent: u32,
    pub good: u32,
    pub average: u32,
    pub poor: u32,
}

/// Average score for one ASIN.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsinPerformance {
    pub asin: String,
    pub average_score: Option<f64>,
    pub count: u32,
}
