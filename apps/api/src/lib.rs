//! Resonance API: the request-path half of the crate (§6), built on the
//! Entity Store, Catalog Writer and Search Orchestrator from `catalog-core`
//! plus the orchestrator-specific services in [`services`].

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

pub use error::{ApiError, ApiResult};
