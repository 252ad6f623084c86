//! Price-paid record
//!
//! A [`LandRegistryData`] is a bag of catalog-typed field values plus the
//! optional map presentation fields (position, radius, colour) that the
//! display pipeline fills in.

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::aggregation::bucketing::PostcodeAggregate;
use crate::heatmap::Colour;
use crate::query_builder::{Attribute, EqualityConstraints, QueryBuildError};

pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";
pub const RADIUS_KEY: &str = "radius";
pub const COLOUR_KEY: &str = "colour";

/// Order address parts are joined in for geocoding.
const ADDRESS_LINE_PARTS: [Attribute; 5] = [
    Attribute::SecondaryHouseName,
    Attribute::PrimaryHouseName,
    Attribute::Street,
    Attribute::Town,
    Attribute::Postcode,
];

/// Two records are equal when their fields are; position, radius and colour
/// are presentation only.
#[derive(Debug, Clone, Default)]
pub struct LandRegistryData {
    fields: EqualityConstraints,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<f64>,
    colour: Option<Colour>,
}

impl PartialEq for LandRegistryData {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl LandRegistryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for one coordinate-store bucket. The price is rounded to whole
    /// pounds.
    pub fn from_aggregate(aggregate: &PostcodeAggregate) -> Self {
        let mut record = Self::new();
        record
            .fields
            .set_unchecked_text(Attribute::Postcode, &aggregate.postcode);
        if aggregate.average_price.is_finite() {
            record
                .fields
                .set_integer(Attribute::PricePaid, aggregate.average_price.round() as i64);
        }
        record.set_position(aggregate.latitude, aggregate.longitude);
        record.radius = Some(aggregate.radius);
        record
    }

    /// Set a field; an empty value removes it.
    pub fn set(&mut self, attribute: Attribute, value: &str) -> Result<(), QueryBuildError> {
        self.fields.set(attribute, value)
    }

    /// Set a field by its untyped name, as found in query results.
    pub fn set_named(&mut self, name: &str, value: &str) -> Result<(), QueryBuildError> {
        self.fields.set_named(name, value)
    }

    pub fn get(&self, attribute: Attribute) -> Option<String> {
        self.fields.get(attribute)
    }

    pub fn remove(&mut self, attribute: Attribute) -> bool {
        self.fields.remove(attribute)
    }

    pub fn fields(&self) -> &EqualityConstraints {
        &self.fields
    }

    pub fn postcode(&self) -> Option<String> {
        self.get(Attribute::Postcode)
    }

    pub fn price(&self) -> Option<i64> {
        self.get(Attribute::PricePaid)
            .and_then(|price| price.parse().ok())
    }

    pub fn set_position(&mut self, latitude: f64, longitude: f64) {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
    }

    pub fn clear_position(&mut self) {
        self.latitude = None;
        self.longitude = None;
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.colour = Some(colour);
    }

    pub fn colour(&self) -> Option<Colour> {
        self.colour
    }

    /// Free-text address for geocoding, e.g. `12, HIGH STREET, WORTHING, BN11 1AA`.
    pub fn address_line(&self) -> String {
        ADDRESS_LINE_PARTS
            .iter()
            .filter_map(|attribute| self.get(*attribute))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Flat JSON shape returned to map clients. Position keys are always
    /// present so a failed geocode shows up as explicit nulls.
    pub fn mappings(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for constraint in self.fields.iter() {
            let attribute = constraint.attribute();
            let value = match attribute {
                Attribute::PricePaid => self
                    .price()
                    .map(Value::from)
                    .unwrap_or_else(|| Value::String(constraint.value())),
                Attribute::NewBuild => Value::Bool(constraint.value() == "true"),
                _ => Value::String(constraint.value()),
            };
            map.insert(attribute.name().to_string(), value);
        }
        map.insert(LATITUDE_KEY.to_string(), optional_number(self.latitude));
        map.insert(LONGITUDE_KEY.to_string(), optional_number(self.longitude));
        if let Some(radius) = self.radius {
            map.insert(RADIUS_KEY.to_string(), optional_number(Some(radius)));
        }
        if let Some(colour) = self.colour {
            map.insert(COLOUR_KEY.to_string(), Value::String(colour.to_hex()));
        }
        map
    }
}

fn optional_number(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl Serialize for LandRegistryData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.mappings().serialize(serializer)
    }
}
