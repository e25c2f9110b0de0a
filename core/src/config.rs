//! Injectable policy tables for the forecast and optimization models.
//!
//! RULE: Every numeric constant the models consume lives here, not in
//! the model code. Category behavior is a table lookup, never a
//! hard-coded branch, so adding a category is a data change.

use crate::product::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a category's demand grows year over year, indexed by the
/// 0-based chronological year offset `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum GrowthModel {
    /// Fast early growth that flattens out: `1 + amplitude * e^(-decay * i)`.
    DecayingBoost { amplitude: f64, decay: f64 },
    /// Steady growth: `1 + rate * i`.
    Linear { rate: f64 },
    /// Slight growth with noise: `1 + rate * i + U(-jitter, jitter)`.
    /// The only stochastic branch in the engine; the draw comes from
    /// the caller-supplied product stream.
    Volatile { rate: f64, jitter: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Exponent of the constant-elasticity demand/price curve.
    /// Negative by convention: raising price depresses demand.
    pub curve_elasticity: f64,
    pub growth: GrowthModel,
    /// Multiplier applied when suggesting a list price for a newly
    /// cataloged product.
    pub list_adjustment: f64,
}

/// Parameters of the historical demand simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForecastParams {
    /// Demand attributed per lifetime unit sold when a product has no
    /// prior estimate.
    pub sold_to_demand_ratio: f64,
    /// Last-resort base demand for a product with no history at all.
    pub default_base_demand: f64,
    /// Amplitude of the seasonal oscillation.
    pub seasonal_amplitude: f64,
    /// Period of the seasonal oscillation, in years.
    pub seasonal_period: f64,
    /// Confidence reported on historical-simulation records.
    pub confidence: f64,
}

/// Thresholds and multipliers of the price optimizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizerRules {
    /// Velocity above which a product counts as a fast mover.
    pub fast_velocity: f64,
    /// Velocity below which a product counts as a slow mover.
    pub slow_velocity: f64,
    pub fast_mover_markup: f64,
    pub slow_mover_markdown: f64,
    /// Elasticity above which demand is treated as elastic.
    pub elastic_threshold: f64,
    /// Elasticity below which demand is treated as inelastic.
    pub inelastic_threshold: f64,
    pub elastic_discount: f64,
    pub inelastic_markup: f64,
    /// Never recommend below cost times this multiple.
    pub margin_floor: f64,
    /// Maximum recommended move, as a fraction of the current price.
    pub max_swing: f64,
    /// Applied changes smaller than this are skipped as no-op writes.
    pub min_applied_change: f64,
}

/// Adjustments used when suggesting an initial list price for a newly
/// cataloged product (no optimization history yet).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListingRules {
    pub fast_mover_markup: f64,
    pub slow_mover_markdown: f64,
    /// Rating at or above which a product commands a premium.
    pub high_rating: u8,
    /// Rating at or below which a product needs competitive pricing.
    pub low_rating: u8,
    pub high_rating_markup: f64,
    pub low_rating_markdown: f64,
    /// Suggested price never drops below this fraction of current.
    pub floor_of_current: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub categories: HashMap<Category, CategoryPolicy>,
    /// Policy for categories missing from the table.
    pub fallback: CategoryPolicy,
    pub forecast: ForecastParams,
    pub optimizer: OptimizerRules,
    pub listing: ListingRules,
}

impl EngineConfig {
    pub fn policy_for(&self, category: Category) -> &CategoryPolicy {
        self.categories.get(&category).unwrap_or(&self.fallback)
    }

    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/category_policies.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests. The values are
    /// the production defaults shipped in data/category_policies.json.
    pub fn default_test() -> Self {
        let volatile = GrowthModel::Volatile {
            rate: 0.03,
            jitter: 0.1,
        };

        let categories = [
            (
                Category::Electronics,
                CategoryPolicy {
                    curve_elasticity: -1.5,
                    growth: GrowthModel::DecayingBoost {
                        amplitude: 0.15,
                        decay: 0.3,
                    },
                    list_adjustment: 1.02,
                },
            ),
            (
                Category::Grocery,
                CategoryPolicy {
                    curve_elasticity: -1.2,
                    growth: volatile,
                    list_adjustment: 0.98,
                },
            ),
            (
                Category::Stationery,
                CategoryPolicy {
                    curve_elasticity: -1.2,
                    growth: volatile,
                    list_adjustment: 1.0,
                },
            ),
            (
                Category::Other,
                CategoryPolicy {
                    curve_elasticity: -1.0,
                    growth: GrowthModel::Linear { rate: 0.05 },
                    list_adjustment: 1.0,
                },
            ),
        ]
        .into();

        Self {
            categories,
            fallback: CategoryPolicy {
                curve_elasticity: -1.2,
                growth: volatile,
                list_adjustment: 1.0,
            },
            forecast: ForecastParams {
                sold_to_demand_ratio: 0.018,
                default_base_demand: 100.0,
                seasonal_amplitude: 0.1,
                seasonal_period: 4.0,
                confidence: 0.85,
            },
            optimizer: OptimizerRules {
                fast_velocity: 2.0,
                slow_velocity: 0.5,
                fast_mover_markup: 1.05,
                slow_mover_markdown: 0.90,
                elastic_threshold: 1.5,
                inelastic_threshold: 0.8,
                elastic_discount: 0.95,
                inelastic_markup: 1.08,
                margin_floor: 1.20,
                max_swing: 0.30,
                min_applied_change: 0.01,
            },
            listing: ListingRules {
                fast_mover_markup: 1.05,
                slow_mover_markdown: 0.95,
                high_rating: 4,
                low_rating: 2,
                high_rating_markup: 1.03,
                low_rating_markdown: 0.97,
                floor_of_current: 0.80,
            },
        }
    }
}
