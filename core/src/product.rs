use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Catalog categories. Upstream import code maps anything it does not
/// recognize to `Other`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electronics,
    Grocery,
    Stationery,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Grocery => "grocery",
            Self::Stationery => "stationery",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "electronics" => Self::Electronics,
            "grocery" => Self::Grocery,
            "stationery" => Self::Stationery,
            _ => Self::Other,
        }
    }
}

/// Read-only product snapshot: everything the engine needs to forecast
/// demand and recommend a price. `base_price >= 0` and
/// `current_price > 0` are enforced upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub category: Category,
    /// Cost price.
    pub base_price: f64,
    /// Selling price.
    pub current_price: f64,
    pub stock_qty: u32,
    pub units_sold: u32,
    /// 0-5 star rating.
    pub customer_rating: u8,
    /// Prior demand estimate, if any. 0 means "none".
    pub demand_forecast: u32,
    /// Price elasticity consumed by the optimizer.
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_elasticity() -> f64 {
    1.2
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Units sold relative to stock on hand: how fast inventory turns.
    pub fn stock_velocity(&self) -> f64 {
        self.units_sold as f64 / self.stock_qty.max(1) as f64
    }

    /// Profit margin percent at the current price.
    pub fn profit_margin(&self) -> f64 {
        if self.current_price > 0.0 {
            (self.current_price - self.base_price) / self.current_price * 100.0
        } else {
            0.0
        }
    }
}

/// One row of the append-only price change audit log. Written only
/// when an optimization is explicitly applied, never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: String,
    pub product_id: ProductId,
    pub old_price: f64,
    pub new_price: f64,
    pub changed_by: String,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}
