//! Sitestats - labor, spending, and safety statistics for a state's construction sector.
//!
//! # Overview
//!
//! Sitestats queries four public statistics APIs in parallel, folds their
//! replies into a handful of summary metrics, and reports whether each
//! source was available. A source that fails never takes the others down
//! with it.
//!
//! # Modules
//!
//! - [`data_sources`]: One client per upstream provider
//! - [`status`]: Per-source availability classification
//! - [`aggregation`]: Metric derivation from source payloads
//! - [`dashboard`]: Concurrent refresh across all sources
//! - [`config`]: Environment-driven configuration
//! - [`model`]: Shared data types
//! - [`api`]: HTTP API handlers

pub mod aggregation;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod data_sources;
pub mod model;
pub mod status;
