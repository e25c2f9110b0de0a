//! Shared primitive types used across the engine.

/// Catalog identifier for a product.
pub type ProductId = i64;

/// A calendar year.
pub type Year = i32;
