pub mod bindings;
pub mod errors;
pub mod ports;
pub mod postcode;
pub mod record;
pub mod service;

pub use bindings::decode_bindings;
pub use errors::{LandRegistryError, TransportError};
pub use ports::{CoordinateStore, GeoPoint, Geocoder, QueryEndpoint};
pub use postcode::{format_postcode, normalize_prefix};
pub use record::LandRegistryData;
pub use service::{LandRegistryService, ServiceSettings};
