//! ClickHouse-backed postcode coordinate store
//!
//! Table layout:
//!
//! ```sql
//! CREATE TABLE postcodelatlng (
//!     postcode String,
//!     latitude Float64,
//!     longitude Float64,
//!     averageprice Int64
//! ) ENGINE = MergeTree() ORDER BY postcode
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use clickhouse::Client;

use super::models::{BucketRow, CountRow, PostcodePriceRow, PostcodeRow};
use crate::aggregation::bucketing::{
    precision_level, radius_expr, truncation_expr, PostcodeAggregate,
};
use crate::aggregation::Viewport;
use crate::land_registry::{CoordinateStore, TransportError};

pub const TABLE_NAME: &str = "postcodelatlng";

const VIEWPORT_FILTER: &str = "averageprice > 0 \
     AND latitude > ? AND latitude < ? \
     AND longitude > ? AND longitude < ?";

pub struct ClickHouseCoordinateStore {
    client: Client,
    result_count: usize,
}

impl ClickHouseCoordinateStore {
    pub fn new(client: Client, result_count: usize) -> Self {
        Self {
            client,
            result_count,
        }
    }

    async fn count_in_viewport(&self, viewport: &Viewport) -> Result<u64, TransportError> {
        let sql = format!(
            "SELECT count() AS rows FROM {} WHERE {}",
            TABLE_NAME, VIEWPORT_FILTER
        );
        let row = self
            .client
            .query(&sql)
            .bind(viewport.bottom)
            .bind(viewport.top)
            .bind(viewport.left)
            .bind(viewport.right)
            .fetch_one::<CountRow>()
            .await?;
        Ok(row.rows)
    }
}

/// Grouped query over the viewport at precision `level`. Parameters, in
/// order: bottom, top, left, right, result limit.
pub(crate) fn bucket_query_sql(level: i32) -> String {
    format!(
        "SELECT \
            {} AS postcode_aggregate, \
            avg(latitude) AS avg_lat, \
            avg(longitude) AS avg_lon, \
            avg(averageprice) AS avg_price, \
            {} AS radius \
         FROM {} \
         WHERE {} \
         GROUP BY postcode_aggregate \
         ORDER BY rand() \
         LIMIT ?",
        truncation_expr("postcode", level),
        radius_expr("latitude", "longitude"),
        TABLE_NAME,
        VIEWPORT_FILTER
    )
}

/// Group postcodes by dropping their last `truncate` characters.
pub(crate) fn group_by_truncation(
    postcodes: Vec<String>,
    truncate: usize,
) -> HashMap<String, Vec<String>> {
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for postcode in postcodes {
        let keep = postcode.chars().count().saturating_sub(truncate);
        let key: String = postcode.chars().take(keep).collect();
        groups.entry(key).or_default().push(postcode);
    }
    groups
}

#[async_trait]
impl CoordinateStore for ClickHouseCoordinateStore {
    async fn query_in_boundaries(
        &self,
        viewport: &Viewport,
        sorted: bool,
    ) -> Result<Vec<PostcodeAggregate>, TransportError> {
        let rows = self.count_in_viewport(viewport).await?;
        if rows == 0 {
            return Ok(Vec::new());
        }
        let level = precision_level(rows, self.result_count, viewport.height());
        log::debug!(
            "{} postcodes in viewport, bucketing at level {}",
            rows,
            level
        );

        let buckets = self
            .client
            .query(&bucket_query_sql(level))
            .bind(viewport.bottom)
            .bind(viewport.top)
            .bind(viewport.left)
            .bind(viewport.right)
            .bind(self.result_count as u64)
            .fetch_all::<BucketRow>()
            .await?;

        let mut aggregates: Vec<PostcodeAggregate> = buckets
            .into_iter()
            .map(|row| PostcodeAggregate {
                postcode: row.postcode_aggregate,
                latitude: row.avg_lat,
                longitude: row.avg_lon,
                average_price: row.avg_price,
                radius: row.radius,
            })
            .collect();
        if sorted {
            aggregates.sort_by(|a, b| a.postcode.cmp(&b.postcode));
        }
        Ok(aggregates)
    }

    async fn update_average_price(
        &self,
        prices: &HashMap<String, i64>,
    ) -> Result<usize, TransportError> {
        if prices.is_empty() {
            return Ok(0);
        }

        let postcodes: Vec<&str> = prices.keys().map(String::as_str).collect();
        let current = self
            .client
            .query(&format!(
                "SELECT postcode, averageprice FROM {} WHERE has(?, postcode)",
                TABLE_NAME
            ))
            .bind(postcodes.as_slice())
            .fetch_all::<PostcodePriceRow>()
            .await?;

        let mut updated = 0;
        for row in current {
            let Some(price) = prices.get(&row.postcode) else {
                continue;
            };
            if row.averageprice == *price {
                continue;
            }
            log::info!(
                "Updating average price for postcode {} to {}",
                row.postcode,
                price
            );
            self.client
                .query(&format!(
                    "ALTER TABLE {} UPDATE averageprice = ? WHERE postcode = ?",
                    TABLE_NAME
                ))
                .bind(*price)
                .bind(row.postcode.as_str())
                .execute()
                .await?;
            updated += 1;
        }
        Ok(updated)
    }

    async fn matching_postcodes(
        &self,
        prefix: &str,
        restrict_to_unset: bool,
        truncate: usize,
    ) -> Result<HashMap<String, Vec<String>>, TransportError> {
        let mut sql = format!(
            "SELECT postcode FROM {} WHERE startsWith(postcode, ?)",
            TABLE_NAME
        );
        if restrict_to_unset {
            sql.push_str(" AND averageprice = 0");
        }

        let rows = self
            .client
            .query(&sql)
            .bind(prefix)
            .fetch_all::<PostcodeRow>()
            .await?;
        Ok(group_by_truncation(
            rows.into_iter().map(|row| row.postcode).collect(),
            truncate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_query_truncates_at_level() {
        let sql = bucket_query_sql(2);
        assert_eq!(sql.matches('?').count(), 5);
        assert!(sql.contains(
            "SELECT substring(postcode, 1, toUInt64(greatest(1, 8 - (5 - toInt64(position(postcode, ' '))) - (2)))) AS postcode_aggregate,"
        ));
        assert!(sql.contains(
            "sqrt(pow(max(latitude) - min(latitude), 2) + pow(max(longitude) - min(longitude), 2)) * 55556.0 AS radius"
        ));
        assert!(sql.contains("FROM postcodelatlng WHERE averageprice > 0"));
        assert!(sql.contains("GROUP BY postcode_aggregate ORDER BY rand() LIMIT ?"));
    }

    #[test]
    fn test_bucket_query_keeps_full_postcodes_below_zero() {
        assert!(bucket_query_sql(-4).contains("- (-4)))) AS postcode_aggregate"));
    }

    #[test]
    fn test_group_by_truncation() {
        let groups = group_by_truncation(
            vec![
                "BN23 7LQ".to_string(),
                "BN23 7LE".to_string(),
                "BN23 8AA".to_string(),
            ],
            1,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["BN23 7L"], vec!["BN23 7LQ", "BN23 7LE"]);
        assert_eq!(groups["BN23 8A"], vec!["BN23 8AA"]);
    }

    #[test]
    fn test_group_by_truncation_handles_short_postcodes() {
        let groups = group_by_truncation(vec!["E1".to_string()], 5);
        assert_eq!(groups[""], vec!["E1"]);
    }
}
