//! Service Areas API Library
//!
//! Providers own priced service area polygons; clients ask which areas cover
//! a coordinate. This library holds the database access, request validation,
//! GeoJSON serialization and HTTP handlers behind the `service-areas-api`
//! binary.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core domain logic.
//! - `data`: Data access layer.
//! - `obs`: Observability and logging.
//! - `config`: Configuration management.
//! - `db`: Database connection, pool management and migrations.
//! - `errors`: Error handling types.
//! - `filters`: Point containment filter for the service area listing.
//! - `geometry`: GeoJSON polygon parsing.
//! - `handlers`: Provider HTTP handlers and shared state.
//! - `links`: Resource hyperlinks.
//! - `models`: Database rows and validated field sets.
//! - `openapi`: OpenAPI document.
//! - `pagination`: FeatureCollection pagination.
//! - `routes`: Route table and middleware.
//! - `serializers`: JSON representations and body checks.
//! - `service_area_handler`: Service area HTTP handlers.
//! - `storage`: SQL for providers and service areas.
//! - `validation`: Field-level checks.

pub mod api;
pub mod core;
pub mod data;
pub mod obs;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod db;
pub mod errors;
pub mod filters;
pub mod geometry;
pub mod handlers;
pub mod links;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod routes;
pub mod serializers;
pub mod service_area_handler;
pub mod storage;
pub mod validation;
