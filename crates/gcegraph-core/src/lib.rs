//! gcegraph-core: inventory collection and aggregation for Compute Engine.
//!
//! Provides:
//! - `collector`: paginated aggregated-list collection (real and mock sources)
//! - `resolver`: machine-type size catalog with user overrides
//! - `aggregate`: per-host records joined from instances, sizes and disks
//! - `summary`: per-region and global totals
//! - `inventory`: the end-to-end collection driver
//! - `config`: credentials file loading
//! - `fmt`: display formatting helpers
//!
//! With `gce` feature (default):
//! - `auth`: OAuth2 access tokens for the Compute API
//! - `collector::GceClient`: blocking HTTPS page source
//!
//! With `api` feature:
//! - `api`: JSON-serializable API and chart types

pub mod aggregate;
pub mod collector;
pub mod config;
pub mod fmt;
pub mod inventory;
pub mod resolver;
pub mod summary;

#[cfg(feature = "gce")]
pub mod auth;

#[cfg(feature = "api")]
pub mod api;

/// Crate version with the git SHA it was built from (e.g. "0.1.0-abc1234").
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GCEGRAPH_GIT_SHA"));
