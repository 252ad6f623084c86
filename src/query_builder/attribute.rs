//! Field catalog for Land Registry price-paid data
//!
//! The catalog is a closed set of attributes. Each attribute belongs to one of
//! two categories:
//!
//! - **Address** attributes hang off the `?addr` subject in the `lrcommon`
//!   namespace and are always quoted strings.
//! - **Transaction** attributes hang off the `?transx` subject in the `lrppi`
//!   namespace and carry typed values (integer, boolean, date or an
//!   enumerated IRI).
//!
//! Wire names (`paon`, `pricePaid`, ...) double as SPARQL variable names, so a
//! result binding can be decoded straight back into an [`Attribute`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::QueryBuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Address,
    Transaction,
}

impl Category {
    pub fn namespace(self) -> &'static str {
        match self {
            Category::Address => "lrcommon",
            Category::Transaction => "lrppi",
        }
    }

    /// Subject variable that attributes of this category are attached to.
    pub fn subject(self) -> &'static str {
        match self {
            Category::Address => "?addr",
            Category::Transaction => "?transx",
        }
    }
}

/// Closed domains for enum-valued transaction attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumDomain {
    PropertyType,
    EstateType,
    TransactionCategory,
}

impl EnumDomain {
    /// Namespace the domain's IRIs live in.
    pub fn namespace(self) -> &'static str {
        match self {
            EnumDomain::PropertyType | EnumDomain::EstateType => "lrcommon",
            EnumDomain::TransactionCategory => "lrppi",
        }
    }

    /// Accepted local names, in their underscore form.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            EnumDomain::PropertyType => &[
                "detached",
                "semi_detached",
                "terraced",
                "flat_maisonette",
                "otherPropertyType",
            ],
            EnumDomain::EstateType => &["freehold", "leasehold"],
            EnumDomain::TransactionCategory => &[
                "standardPricePaidTransaction",
                "additionalPricePaidTransaction",
            ],
        }
    }

    pub fn contains(self, value: &str) -> bool {
        self.values().contains(&value)
    }
}

/// How an attribute's value is typed and rendered as a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
    Date,
    Enum(EnumDomain),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "paon")]
    PrimaryHouseName,
    #[serde(rename = "saon")]
    SecondaryHouseName,
    #[serde(rename = "street")]
    Street,
    #[serde(rename = "locality")]
    Locality,
    #[serde(rename = "town")]
    Town,
    #[serde(rename = "district")]
    District,
    #[serde(rename = "county")]
    County,
    #[serde(rename = "postcode")]
    Postcode,
    #[serde(rename = "propertyType")]
    PropertyType,
    #[serde(rename = "newBuild")]
    NewBuild,
    #[serde(rename = "estateType")]
    EstateType,
    #[serde(rename = "transactionCategory")]
    TransactionCategory,
    #[serde(rename = "pricePaid")]
    PricePaid,
    #[serde(rename = "transactionDate")]
    TransactionDate,
}

impl Attribute {
    pub const ALL: [Attribute; 14] = [
        Attribute::PrimaryHouseName,
        Attribute::SecondaryHouseName,
        Attribute::Street,
        Attribute::Locality,
        Attribute::Town,
        Attribute::District,
        Attribute::County,
        Attribute::Postcode,
        Attribute::PropertyType,
        Attribute::NewBuild,
        Attribute::EstateType,
        Attribute::TransactionCategory,
        Attribute::PricePaid,
        Attribute::TransactionDate,
    ];

    /// Attributes that identify a single property address.
    pub const IDENTITY: [Attribute; 4] = [
        Attribute::PrimaryHouseName,
        Attribute::SecondaryHouseName,
        Attribute::Street,
        Attribute::Postcode,
    ];

    /// Wire name, used both as the predicate local name and the variable name.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::PrimaryHouseName => "paon",
            Attribute::SecondaryHouseName => "saon",
            Attribute::Street => "street",
            Attribute::Locality => "locality",
            Attribute::Town => "town",
            Attribute::District => "district",
            Attribute::County => "county",
            Attribute::Postcode => "postcode",
            Attribute::PropertyType => "propertyType",
            Attribute::NewBuild => "newBuild",
            Attribute::EstateType => "estateType",
            Attribute::TransactionCategory => "transactionCategory",
            Attribute::PricePaid => "pricePaid",
            Attribute::TransactionDate => "transactionDate",
        }
    }

    pub fn descriptive_name(self) -> &'static str {
        match self {
            Attribute::PrimaryHouseName => "primaryHouseName",
            Attribute::SecondaryHouseName => "secondaryHouseName",
            other => other.name(),
        }
    }

    pub fn category(self) -> Category {
        match self {
            Attribute::PrimaryHouseName
            | Attribute::SecondaryHouseName
            | Attribute::Street
            | Attribute::Locality
            | Attribute::Town
            | Attribute::District
            | Attribute::County
            | Attribute::Postcode => Category::Address,
            _ => Category::Transaction,
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Attribute::PropertyType => ValueKind::Enum(EnumDomain::PropertyType),
            Attribute::EstateType => ValueKind::Enum(EnumDomain::EstateType),
            Attribute::TransactionCategory => ValueKind::Enum(EnumDomain::TransactionCategory),
            Attribute::NewBuild => ValueKind::Boolean,
            Attribute::PricePaid => ValueKind::Integer,
            Attribute::TransactionDate => ValueKind::Date,
            _ => ValueKind::Text,
        }
    }

    /// Prefixed predicate, e.g. `lrcommon:postcode`.
    pub fn predicate(self) -> String {
        format!("{}:{}", self.category().namespace(), self.name())
    }

    pub fn is_enum_valued(self) -> bool {
        matches!(self.value_kind(), ValueKind::Enum(_))
    }

    pub fn is_string_quoted(self) -> bool {
        matches!(self.value_kind(), ValueKind::Text | ValueKind::Date)
    }

    /// Address parts that many records leave blank; bound with OPTIONAL.
    pub fn is_sparse(self) -> bool {
        matches!(
            self,
            Attribute::PrimaryHouseName
                | Attribute::SecondaryHouseName
                | Attribute::Street
                | Attribute::Locality
                | Attribute::District
                | Attribute::County
        )
    }

    /// `?paon`
    pub fn variable(self) -> String {
        format!("?{}", self.name())
    }

    /// Output variable for an aggregated projection: `?PricePaid`.
    pub fn aggregate_variable(self) -> String {
        format!("?{}", capitalize(self.name()))
    }

    /// Resolve an untyped field name.
    ///
    /// Matching ignores the case of the first character so that aggregate
    /// output names (`TransactionDate`) decode to the same attribute as their
    /// source variable.
    pub fn from_name(name: &str) -> Result<Self, QueryBuildError> {
        if name.chars().count() < 2 {
            return Err(QueryBuildError::UnknownAttribute(name.to_string()));
        }
        let normalized = decapitalize(name);
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.name() == normalized || a.descriptive_name() == normalized)
            .ok_or_else(|| QueryBuildError::UnknownAttribute(name.to_string()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = QueryBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::from_name(s)
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_split_address_and_transaction() {
        let address: Vec<_> = Attribute::ALL
            .iter()
            .filter(|a| a.category() == Category::Address)
            .collect();
        assert_eq!(address.len(), 8);
        assert_eq!(Attribute::PricePaid.category(), Category::Transaction);
        assert_eq!(Attribute::Postcode.predicate(), "lrcommon:postcode");
        assert_eq!(Attribute::PricePaid.predicate(), "lrppi:pricePaid");
    }

    #[test]
    fn test_from_name_normalizes_first_character() {
        assert_eq!(
            Attribute::from_name("TransactionDate").unwrap(),
            Attribute::TransactionDate
        );
        assert_eq!(Attribute::from_name("PricePaid").unwrap(), Attribute::PricePaid);
        assert_eq!(Attribute::from_name("paon").unwrap(), Attribute::PrimaryHouseName);
        assert_eq!(
            Attribute::from_name("primaryHouseName").unwrap(),
            Attribute::PrimaryHouseName
        );
    }

    #[test]
    fn test_from_name_rejects_unknown_names() {
        assert_eq!(
            Attribute::from_name("AveragePrice"),
            Err(QueryBuildError::UnknownAttribute("AveragePrice".to_string()))
        );
        assert!(Attribute::from_name("p").is_err());
        assert!(Attribute::from_name("").is_err());
        // Only the first character is case-insensitive
        assert!(Attribute::from_name("PRICEPAID").is_err());
    }

    #[test]
    fn test_quoting_rules() {
        for attribute in Attribute::ALL {
            if attribute.category() == Category::Address {
                assert!(attribute.is_string_quoted(), "{} must be quoted", attribute);
            }
        }
        assert!(!Attribute::PricePaid.is_string_quoted());
        assert!(!Attribute::NewBuild.is_string_quoted());
        assert!(!Attribute::PropertyType.is_string_quoted());
        assert!(Attribute::TransactionDate.is_string_quoted());
    }

    #[test]
    fn test_aggregate_variable_capitalizes() {
        assert_eq!(Attribute::TransactionDate.aggregate_variable(), "?TransactionDate");
        assert_eq!(Attribute::PrimaryHouseName.aggregate_variable(), "?Paon");
    }

    #[test]
    fn test_enum_domains() {
        assert!(Attribute::EstateType.is_enum_valued());
        assert!(EnumDomain::PropertyType.contains("semi_detached"));
        assert!(!EnumDomain::PropertyType.contains("semi-detached"));
        assert_eq!(EnumDomain::TransactionCategory.namespace(), "lrppi");
    }
}
