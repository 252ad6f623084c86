//! Postcode bucketing precision
//!
//! At coarse zoom levels postcodes are grouped by a truncated prefix. The
//! prefix gets shorter as the viewport grows and as more rows fall inside it,
//! which keeps the number of buckets near the target result count.
//!
//! ```text
//! scaling_modifier = clamp(ceil(log3(delta)), 0, 3)
//! level            = min(3, floor(log10(rows / (R * 5))) + scaling_modifier)
//! truncation       = 8 - space_offset - level
//! ```
//!
//! The level is computed here; the truncation and radius run inside the
//! coordinate store's grouped query, rendered by [`truncation_expr`] and
//! [`radius_expr`].

use serde::{Deserialize, Serialize};

/// Degrees to metres, roughly, used to turn a bucket's coordinate span into
/// a heatmap radius.
pub const RADIUS_SCALE: f64 = 55_556.0;

pub const DEFAULT_RESULT_COUNT: usize = 1000;

/// Rows per requested result before a coarser precision kicks in.
const ROWS_PER_RESULT: f64 = 5.0;

/// Key length before the space offset and level are taken off.
const TRUNCATION_BASE: i32 = 8;

/// `space_offset = SPACE_OFFSET_BASE - position of the space`.
const SPACE_OFFSET_BASE: i32 = 5;

/// Lowest level ever produced. Anything below this keeps the full postcode.
const MIN_LEVEL: i32 = -8;

const MAX_LEVEL: i32 = 3;

/// One postcode bucket as returned by the coordinate store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostcodeAggregate {
    /// Truncated postcode shared by every member of the bucket.
    pub postcode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub average_price: f64,
    /// Metres.
    pub radius: f64,
}

/// Extra coarseness for tall viewports: `clamp(ceil(log3(delta)), 0, 3)`.
pub fn scaling_modifier(delta: f64) -> i32 {
    if delta.is_nan() || delta <= 0.0 {
        return 0;
    }
    let steps = (delta.ln() / 3f64.ln()).ceil();
    steps.clamp(0.0, MAX_LEVEL as f64) as i32
}

/// How many characters to drop from each postcode, before accounting for
/// where its space sits.
pub fn precision_level(row_count: u64, result_count: usize, delta: f64) -> i32 {
    let target = (result_count.max(1) as f64) * ROWS_PER_RESULT;
    let density = (row_count.max(1) as f64 / target).log10().floor() as i32;
    (density + scaling_modifier(delta)).clamp(MIN_LEVEL, MAX_LEVEL)
}

/// ClickHouse expression for the bucket key of `column` at `level`:
/// `8 - (5 - position of the space) - level` leading characters, never fewer
/// than one. `position` is 1-based and 0 when there is no space.
pub fn truncation_expr(column: &str, level: i32) -> String {
    format!(
        "substring({column}, 1, toUInt64(greatest(1, {TRUNCATION_BASE} - ({SPACE_OFFSET_BASE} - toInt64(position({column}, ' '))) - ({level}))))"
    )
}

/// ClickHouse aggregate for a bucket's radius in metres: the diagonal of its
/// coordinate span scaled by [`RADIUS_SCALE`].
pub fn radius_expr(latitude: &str, longitude: &str) -> String {
    format!(
        "sqrt(pow(max({latitude}) - min({latitude}), 2) + pow(max({longitude}) - min({longitude}), 2)) * {RADIUS_SCALE:.1}"
    )
}
