//! SPARQL query builder for the Land Registry price-paid dataset
//!
//! Queries are assembled from three independent parts, a constraint set, a
//! select set and a group set, which are composed into one query string
//! against a shared [`QueryTemplate`].

pub mod attribute;
pub mod constraint;
pub mod errors;
pub mod group_by;
pub mod query;
pub mod select;

// Re-export commonly used types
pub use attribute::{Attribute, Category, EnumDomain, ValueKind};
pub use constraint::{is_valid_postcode, ConstraintSet, EqualityConstraint, EqualityConstraints};
pub use errors::QueryBuildError;
pub use group_by::GroupSet;
pub use query::{
    aggregate_by_field, average_price_for_postcodes, compose, latest_sales_only, ProjectionMode,
    Query, QueryTemplate, DEFAULT_PROLOGUE,
};
pub use select::{Aggregation, SelectSet};
