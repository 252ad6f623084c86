//! Land Registry service
//!
//! Ties the query builder, the coordinate store and the geocoder together.
//! Every remote call is bounded by the configured request timeout. A failed
//! query fails the whole request; a failed geocode only blanks the position
//! of the record it was for.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use validator::Validate;

use super::bindings::decode_bindings;
use super::errors::{LandRegistryError, TransportError};
use super::ports::{CoordinateStore, Geocoder, QueryEndpoint};
use super::postcode::normalize_prefix;
use super::record::LandRegistryData;
use crate::aggregation::{
    address_tier_query, DisplayData, PostcodeAggregate, Tier, TierThresholds, Viewport,
};
use crate::heatmap::{colour_magnitudes, ColourScale, HeatMapDataPoint, NormalizeParams};
use crate::query_builder::{
    average_price_for_postcodes, is_valid_postcode, latest_sales_only, Attribute, ConstraintSet,
    Query, QueryTemplate,
};

pub const DEFAULT_MAX_GEOCODE_ADDRESSES: usize = 100;
pub const DEFAULT_TRANSACTION_WINDOW_YEARS: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters dropped from each postcode when grouping a refresh.
const REFRESH_GROUP_TRUNCATION: usize = 1;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub thresholds: TierThresholds,
    pub max_geocode_addresses: usize,
    pub transaction_window_years: u32,
    pub request_timeout: Duration,
    pub colours: ColourScale,
    pub normalize: NormalizeParams,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            max_geocode_addresses: DEFAULT_MAX_GEOCODE_ADDRESSES,
            transaction_window_years: DEFAULT_TRANSACTION_WINDOW_YEARS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            colours: ColourScale::default(),
            normalize: NormalizeParams::default(),
        }
    }
}

pub struct LandRegistryService {
    endpoint: Arc<dyn QueryEndpoint>,
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn CoordinateStore>,
    template: Arc<QueryTemplate>,
    settings: ServiceSettings,
}

impl LandRegistryService {
    pub fn new(
        endpoint: Arc<dyn QueryEndpoint>,
        geocoder: Arc<dyn Geocoder>,
        store: Arc<dyn CoordinateStore>,
        template: Arc<QueryTemplate>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            endpoint,
            geocoder,
            store,
            template,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let after = self.settings.request_timeout;
        timeout(after, call)
            .await
            .map_err(|_| TransportError::Timeout { operation, after })?
    }

    /// Run `query` against the triple store and decode every result row.
    pub async fn get_transactions(
        &self,
        query: &Query,
    ) -> Result<Vec<LandRegistryData>, LandRegistryError> {
        let text = query.compose(&self.template);
        log::debug!("Executing SPARQL query ({} bytes)", text.len());

        let response = self
            .bounded("SPARQL query", self.endpoint.execute(&text))
            .await?;
        let records = decode_bindings(&response)?;
        log::debug!("SPARQL query returned {} records", records.len());
        Ok(records)
    }

    /// Latest sale for every address matching `constraints`.
    pub async fn get_latest_transactions(
        &self,
        constraints: ConstraintSet,
        attributes: &[Attribute],
    ) -> Result<Vec<LandRegistryData>, LandRegistryError> {
        self.get_transactions(&latest_sales_only(constraints, attributes))
            .await
    }

    /// Average latest-sale price per postcode, rounded to whole pounds.
    ///
    /// Every requested postcode appears in the result; postcodes without
    /// sales map to `None`.
    pub async fn get_all_postcode_prices(
        &self,
        postcodes: &[String],
    ) -> Result<BTreeMap<String, Option<i64>>, LandRegistryError> {
        let requested: Vec<String> = postcodes
            .iter()
            .map(|postcode| postcode.trim().to_uppercase())
            .collect();
        if requested.is_empty() {
            return Ok(BTreeMap::new());
        }

        let query = average_price_for_postcodes(&requested)?;
        let records = self.get_transactions(&query).await?;

        let found: HashMap<String, i64> = records
            .iter()
            .filter_map(|record| Some((record.postcode()?, record.price()?)))
            .collect();

        Ok(requested
            .into_iter()
            .map(|postcode| {
                let price = found.get(&postcode).copied();
                (postcode, price)
            })
            .collect())
    }

    /// Recompute cached average prices for every postcode under `prefix`.
    /// Returns how many stored prices changed.
    pub async fn update_postcode_database(&self, prefix: &str) -> Result<usize, LandRegistryError> {
        let prefix = normalize_prefix(prefix)?;
        let buckets = self
            .bounded(
                "postcode lookup",
                self.store
                    .matching_postcodes(&prefix, false, REFRESH_GROUP_TRUNCATION),
            )
            .await?;
        log::info!("Refreshing {} postcode groups under {}", buckets.len(), prefix);

        let mut prices: HashMap<String, i64> = HashMap::new();
        let ordered: BTreeMap<_, _> = buckets.into_iter().collect();
        for (bucket, postcodes) in ordered {
            let (valid, invalid): (Vec<String>, Vec<String>) = postcodes
                .into_iter()
                .partition(|postcode| is_valid_postcode(postcode));
            if !invalid.is_empty() {
                log::warn!(
                    "Skipping {} malformed postcodes in group {}",
                    invalid.len(),
                    bucket
                );
            }
            if valid.is_empty() {
                continue;
            }

            let averages = self.get_all_postcode_prices(&valid).await?;
            prices.extend(
                averages
                    .into_iter()
                    .filter_map(|(postcode, price)| price.map(|price| (postcode, price))),
            );
        }

        let updated = self
            .bounded("average price update", self.store.update_average_price(&prices))
            .await?;
        log::info!("Updated {} of {} average prices", updated, prices.len());
        Ok(updated)
    }

    /// Tiered map data for `viewport`.
    pub async fn get_display_data(
        &self,
        viewport: &Viewport,
    ) -> Result<DisplayData, LandRegistryError> {
        viewport
            .validate()
            .map_err(|e| LandRegistryError::InvalidViewport(e.to_string()))?;

        let aggregates = self
            .bounded(
                "coordinate lookup",
                self.store.query_in_boundaries(viewport, false),
            )
            .await?;
        let tier = self.settings.thresholds.select(aggregates.len());
        log::info!(
            "Viewport matched {} postcode records, serving {:?} tier",
            aggregates.len(),
            tier
        );

        match tier {
            Tier::Empty => Ok(DisplayData::Empty),
            Tier::Address => {
                let Some(query) = address_tier_query(
                    &aggregates,
                    Utc::now().date_naive(),
                    self.settings.transaction_window_years,
                )?
                else {
                    return Ok(DisplayData::Addresses(Vec::new()));
                };
                let records = self.get_transactions(&query).await?;
                let mut records = self.get_address_positions(records).await?;
                self.colour_by_price(&mut records)?;
                Ok(DisplayData::Addresses(records))
            }
            Tier::Point => {
                let mut records: Vec<LandRegistryData> = aggregates
                    .iter()
                    .map(LandRegistryData::from_aggregate)
                    .collect();
                self.colour_by_price(&mut records)?;
                Ok(DisplayData::Points(records))
            }
            Tier::Heatmap => Ok(DisplayData::Heatmap(self.heatmap_points(&aggregates)?)),
        }
    }

    /// Geocode each record's address in order. A failed or timed-out lookup
    /// leaves that record without a position.
    pub async fn get_address_positions(
        &self,
        records: Vec<LandRegistryData>,
    ) -> Result<Vec<LandRegistryData>, LandRegistryError> {
        let limit = self.settings.max_geocode_addresses;
        if records.len() > limit {
            return Err(LandRegistryError::TooManyAddresses {
                count: records.len(),
                limit,
            });
        }

        let mut positioned = Vec::with_capacity(records.len());
        for mut record in records {
            let address = record.address_line();
            match self.bounded("geocode", self.geocoder.resolve(&address)).await {
                Ok(point) => record.set_position(point.lat, point.lng),
                Err(e) => {
                    log::warn!("Failed to geocode `{}`: {}", address, e);
                    record.clear_position();
                }
            }
            positioned.push(record);
        }
        Ok(positioned)
    }

    /// Colour records by price relative to each other. Records without a
    /// positive price are left uncoloured.
    fn colour_by_price(&self, records: &mut [LandRegistryData]) -> Result<(), LandRegistryError> {
        let priced: Vec<(usize, f64)> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record
                    .price()
                    .filter(|price| *price > 0)
                    .map(|price| (index, price as f64))
            })
            .collect();
        if priced.is_empty() {
            return Ok(());
        }

        let magnitudes: Vec<f64> = priced.iter().map(|(_, price)| *price).collect();
        let colours = colour_magnitudes(
            &magnitudes,
            &self.settings.colours,
            self.settings.normalize,
        )?;
        for ((index, _), colour) in priced.iter().zip(colours) {
            records[*index].set_colour(colour);
        }
        Ok(())
    }

    fn heatmap_points(
        &self,
        aggregates: &[PostcodeAggregate],
    ) -> Result<Vec<HeatMapDataPoint>, LandRegistryError> {
        let usable: Vec<&PostcodeAggregate> = aggregates
            .iter()
            .filter(|aggregate| aggregate.average_price.is_finite() && aggregate.average_price > 0.0)
            .collect();
        if usable.len() < aggregates.len() {
            log::debug!(
                "Dropped {} heatmap buckets without a price",
                aggregates.len() - usable.len()
            );
        }
        if usable.is_empty() {
            return Ok(Vec::new());
        }

        let magnitudes: Vec<f64> = usable.iter().map(|a| a.average_price).collect();
        let colours = colour_magnitudes(
            &magnitudes,
            &self.settings.colours,
            self.settings.normalize,
        )?;
        Ok(usable
            .into_iter()
            .zip(colours)
            .map(|(aggregate, colour)| HeatMapDataPoint {
                latitude: aggregate.latitude,
                longitude: aggregate.longitude,
                radius: aggregate.radius,
                colour,
            })
            .collect())
    }
}
