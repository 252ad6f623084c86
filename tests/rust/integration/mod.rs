//! Integration tests - HTTP API driven end to end over in-memory collaborators
//!
//! The SPARQL endpoint, geocoder and coordinate store are replaced with fakes,
//! so these tests run without network access or a ClickHouse instance.

mod http_api_tests;
