//! Landmap - Land Registry price-paid data for map clients
//!
//! This crate turns map viewports into price-coloured map layers through:
//! - A SPARQL query builder over the Land Registry price-paid dataset
//! - Tier selection between addresses, postcode points and heatmaps
//! - Log-logistic normalization and a green/yellow/red colour scale
//! - An HTTP API backed by ClickHouse postcode coordinates

pub mod aggregation;
pub mod config;
pub mod heatmap;
pub mod land_registry;
pub mod query_builder;
pub mod server;
