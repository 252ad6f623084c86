pub mod bucketing;
pub mod tier;

pub use bucketing::{precision_level, PostcodeAggregate, RADIUS_SCALE};
pub use tier::{address_tier_query, DisplayData, Tier, TierThresholds, Viewport};
