//! bankdash-core: customer cache, query engine and backend gateway for the
//! back-office banking dashboard.
//!
//! LAYERS:
//!   gateway : typed calls to the backend (HTTP) or seeded demo data
//!   engine  : owns the customer cache; single-flight population
//!   query   : read-only search/filter pipeline over a cache snapshot
//!
//! RULE: Only the engine writes the cache. Everything else reads snapshots.

pub mod cache;
pub mod config;
pub mod customer;
pub mod engine;
pub mod error;
pub mod format;
pub mod gateway;
pub mod metrics;
pub mod name_generator;
pub mod query;
pub mod rng;
pub mod types;
