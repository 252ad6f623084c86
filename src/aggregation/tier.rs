//! Spatial tier selection
//!
//! The number of postcode records inside a viewport decides how much detail
//! the map gets back:
//!
//! | Tier    | Count               | Output                                   |
//! |---------|---------------------|------------------------------------------|
//! | Empty   | `0`                 | nothing                                  |
//! | Address | `1..=address_max`   | latest sale per address, geocoded        |
//! | Point   | `address_max+1..point_max` | one coloured record per bucket    |
//! | Heatmap | `point_max..`       | weighted heatmap points                  |

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::bucketing::PostcodeAggregate;
use crate::heatmap::HeatMapDataPoint;
use crate::land_registry::record::LandRegistryData;
use crate::query_builder::{
    is_valid_postcode, latest_sales_only, Attribute, ConstraintSet, Query, QueryBuildError,
};

pub const DEFAULT_ADDRESS_TIER_MAX: usize = 15;
pub const DEFAULT_POINT_TIER_MAX: usize = 500;

/// Attributes fetched for address-tier records on top of the identity columns.
pub const ADDRESS_TIER_ATTRIBUTES: [Attribute; 4] = [
    Attribute::PrimaryHouseName,
    Attribute::Street,
    Attribute::Town,
    Attribute::PricePaid,
];

/// Map bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_bounds"))]
pub struct Viewport {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub top: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub right: f64,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub bottom: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub left: f64,
}

fn validate_bounds(viewport: &Viewport) -> Result<(), ValidationError> {
    if viewport.top < viewport.bottom {
        return Err(ValidationError::new("top_below_bottom"));
    }
    if viewport.right < viewport.left {
        return Err(ValidationError::new("right_before_left"));
    }
    Ok(())
}

impl Viewport {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Latitude span; drives bucket coarseness.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Empty,
    Address,
    Point,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    /// Largest count still served at address level (T1).
    pub address_max: usize,
    /// Counts at or above this are served as a heatmap (T2).
    pub point_max: usize,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            address_max: DEFAULT_ADDRESS_TIER_MAX,
            point_max: DEFAULT_POINT_TIER_MAX,
        }
    }
}

impl TierThresholds {
    /// `None` unless `0 < address_max < point_max`.
    pub fn new(address_max: usize, point_max: usize) -> Option<Self> {
        (address_max > 0 && address_max < point_max).then_some(Self {
            address_max,
            point_max,
        })
    }

    pub fn select(&self, count: usize) -> Tier {
        if count == 0 {
            Tier::Empty
        } else if count <= self.address_max {
            Tier::Address
        } else if count < self.point_max {
            Tier::Point
        } else {
            Tier::Heatmap
        }
    }
}

/// Tiered response for one viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tier", content = "data", rename_all = "lowercase")]
pub enum DisplayData {
    Empty,
    Addresses(Vec<LandRegistryData>),
    Points(Vec<LandRegistryData>),
    Heatmap(Vec<HeatMapDataPoint>),
}

impl DisplayData {
    pub fn tier(&self) -> Tier {
        match self {
            DisplayData::Empty => Tier::Empty,
            DisplayData::Addresses(_) => Tier::Address,
            DisplayData::Points(_) => Tier::Point,
            DisplayData::Heatmap(_) => Tier::Heatmap,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DisplayData::Empty => 0,
            DisplayData::Addresses(records) | DisplayData::Points(records) => records.len(),
            DisplayData::Heatmap(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Latest sales within `window_years` of `today` for the postcodes found in
/// the viewport. Bucket keys that are not full postcodes are skipped; `None`
/// when none are left.
pub fn address_tier_query(
    aggregates: &[PostcodeAggregate],
    today: NaiveDate,
    window_years: u32,
) -> Result<Option<Query>, QueryBuildError> {
    let postcodes: Vec<&str> = aggregates
        .iter()
        .map(|aggregate| aggregate.postcode.as_str())
        .filter(|postcode| {
            let valid = is_valid_postcode(postcode);
            if !valid {
                log::debug!("Skipping partial postcode `{}` in address tier", postcode);
            }
            valid
        })
        .collect();
    if postcodes.is_empty() {
        return Ok(None);
    }

    let mut constraints = ConstraintSet::new();
    constraints.set_postcodes(postcodes)?;
    constraints.set_min_date(window_start(today, window_years));
    Ok(Some(latest_sales_only(constraints, &ADDRESS_TIER_ATTRIBUTES)))
}

/// First day of the `window_years` sales window ending `today`.
pub(crate) fn window_start(today: NaiveDate, window_years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(window_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}
