//! Pure freshness decisions for stored records.
//!
//! The gate performs no I/O: callers supply both the record timestamp and the
//! current instant, which keeps the windows directly testable.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{OPTIMIZATION_FRESH_SECS, PRODUCT_FRESH_SECS};

/// Which freshness window applies to a stored record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FreshnessKind {
    /// A fetched product row, fresh for 24 hours from its last update.
    FetchedProduct,
    /// A generated optimization row, fresh for 1 hour from its creation.
    Generated,
}

/// Returns `true` when a record stamped `last` is still fresh at `now`.
pub fn is_fresh(last: DateTime<Utc>, kind: FreshnessKind, now: DateTime<Utc>) -> bool {
    let window = match kind {
        FreshnessKind::FetchedProduct => PRODUCT_FRESH_SECS,
        FreshnessKind::Generated => OPTIMIZATION_FRESH_SECS,
    };

    now.signed_duration_since(last).num_seconds() < window
}

/// Marker on a response distinguishing a cache hit from a fresh computation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Computed anew during this call.
    Fresh,
    /// Served from storage without redoing the expensive operation.
    Cached,
}
