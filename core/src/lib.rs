//! pricecast-core: deterministic demand forecasting and price
//! optimization for a marketplace catalog.
//!
//! The engine is a set of pure numeric models (historical demand
//! simulation, a constant-elasticity demand/price curve, a bounded
//! factor-based price optimizer, and aggregation reducers) behind a
//! small facade that owns the policy tables, the SQLite store, and
//! one master seed for the single stochastic branch.

pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
mod num;
pub mod optimize;
pub mod product;
pub mod report;
pub mod rng;
pub mod store;
pub mod types;
