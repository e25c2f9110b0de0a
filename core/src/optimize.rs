//! Price optimization — bounded, explainable price recommendations.
//!
//! RULE: optimize() never raises. A degenerate snapshot (non-positive
//! or non-finite price) degrades to a zero-confidence, no-change
//! result carrying an error description. Callers can always consume
//! the output without a fallible path of their own.

use serde::{Deserialize, Serialize};

use crate::{
    config::EngineConfig,
    num::{round1, round2},
    product::{Category, Product},
    types::ProductId,
};

/// Separator between reasoning clauses.
pub const REASONING_SEPARATOR: &str = " | ";

/// Named multiplicative factors applied to the current price.
/// `margin` and `competition` are reserved extension points: always
/// present in the output, currently neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceFactors {
    pub stock: f64,
    pub demand: f64,
    pub margin: f64,
    pub competition: f64,
}

impl PriceFactors {
    pub fn neutral() -> Self {
        Self {
            stock: 1.0,
            demand: 1.0,
            margin: 1.0,
            competition: 1.0,
        }
    }

    pub fn combined(&self) -> f64 {
        self.stock * self.demand * self.margin * self.competition
    }
}

/// The optimizer's output for one product. On the failure path,
/// `error` is set, `reasoning` is empty, the price is unchanged, and
/// `confidence_score` is exactly 0; otherwise confidence lies in
/// [60, 95].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecommendation {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub category: Category,
    pub units_sold: u32,
    pub stock_qty: u32,
    pub original_price: f64,
    pub optimized_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub factors_applied: PriceFactors,
    pub confidence_score: f64,
    pub reasoning: String,
    pub error: Option<String>,
}

pub struct PriceOptimizer<'a> {
    config: &'a EngineConfig,
}

impl<'a> PriceOptimizer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Total function: swallow-and-report, never an Err.
    pub fn optimize(&self, product: &Product) -> PriceRecommendation {
        match self.try_optimize(product) {
            Ok(recommendation) => recommendation,
            Err(reason) => {
                log::warn!(
                    "pricing: optimization degraded for {} ({}): {reason}",
                    product.sku,
                    product.id
                );
                PriceRecommendation {
                    product_id: product.id,
                    sku: product.sku.clone(),
                    name: product.name.clone(),
                    category: product.category,
                    units_sold: product.units_sold,
                    stock_qty: product.stock_qty,
                    original_price: product.current_price,
                    optimized_price: product.current_price,
                    price_change: 0.0,
                    price_change_percent: 0.0,
                    factors_applied: PriceFactors::neutral(),
                    confidence_score: 0.0,
                    reasoning: String::new(),
                    error: Some(reason),
                }
            }
        }
    }

    fn try_optimize(&self, product: &Product) -> Result<PriceRecommendation, String> {
        let rules = &self.config.optimizer;
        let current_price = product.current_price;

        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(format!("current price must be positive, got {current_price}"));
        }
        if !product.base_price.is_finite() || product.base_price < 0.0 {
            return Err(format!(
                "base price must be non-negative, got {}",
                product.base_price
            ));
        }

        let velocity = product.stock_velocity();
        let mut factors = PriceFactors::neutral();

        if velocity > rules.fast_velocity {
            // Fast mover: the market bears a higher price.
            factors.stock = rules.fast_mover_markup;
        } else if velocity < rules.slow_velocity {
            // Slow mover: discount to move inventory.
            factors.stock = rules.slow_mover_markdown;
        }

        if product.elasticity > rules.elastic_threshold {
            // Elastic demand: lower price to stimulate volume.
            factors.demand = rules.elastic_discount;
        } else if product.elasticity < rules.inelastic_threshold {
            // Inelastic demand: extract margin.
            factors.demand = rules.inelastic_markup;
        }

        let mut optimized = current_price * factors.combined();

        // Never recommend below cost plus the margin floor.
        optimized = optimized.max(product.base_price * rules.margin_floor);

        // Stay within the swing bound of the current price.
        let min_bound = current_price * (1.0 - rules.max_swing);
        let max_bound = current_price * (1.0 + rules.max_swing);
        optimized = optimized.clamp(min_bound, max_bound);

        let optimized = round2(optimized);
        let change_percent = (optimized - current_price) / current_price * 100.0;
        let confidence = (85.0 - change_percent.abs()).clamp(60.0, 95.0);

        Ok(PriceRecommendation {
            product_id: product.id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            category: product.category,
            units_sold: product.units_sold,
            stock_qty: product.stock_qty,
            original_price: current_price,
            optimized_price: optimized,
            price_change: round2(optimized - current_price),
            price_change_percent: round1(change_percent),
            factors_applied: factors,
            confidence_score: confidence,
            reasoning: reasoning(&factors, change_percent),
            error: None,
        })
    }

    /// Suggested list price for a newly cataloged product with no
    /// optimization history: velocity, category, and rating
    /// adjustments under the usual margin floor and swing cap.
    /// Returns 0.0 when the product has no current price yet.
    pub fn initial_price(&self, product: &Product) -> f64 {
        let rules = &self.config.optimizer;
        let listing = &self.config.listing;
        let current_price = product.current_price;

        if !(current_price.is_finite() && current_price > 0.0) {
            return 0.0;
        }

        let mut price = current_price;

        if product.stock_qty > 0 && product.units_sold > 0 {
            let velocity = product.stock_velocity();
            if velocity > rules.fast_velocity {
                price = current_price * listing.fast_mover_markup;
            } else if velocity < rules.slow_velocity {
                price = current_price * listing.slow_mover_markdown;
            }
        }

        price *= self.config.policy_for(product.category).list_adjustment;

        if product.customer_rating >= listing.high_rating {
            price *= listing.high_rating_markup;
        } else if product.customer_rating <= listing.low_rating {
            price *= listing.low_rating_markdown;
        }

        if product.base_price > 0.0 {
            price = price.max(product.base_price * rules.margin_floor);
        }
        price = price.min(current_price * (1.0 + rules.max_swing));
        price = price.max(current_price * listing.floor_of_current);

        round2(price)
    }
}

/// One clause per factor that materially deviates from neutral, plus
/// a near-optimal note for small moves.
fn reasoning(factors: &PriceFactors, change_percent: f64) -> String {
    let mut clauses: Vec<&str> = Vec::new();

    if factors.stock > 1.02 {
        clauses.push("High demand product - price increase recommended");
    } else if factors.stock < 0.95 {
        clauses.push("Slow-moving inventory - price reduction to accelerate sales");
    }

    if factors.demand > 1.05 {
        clauses.push("Low price elasticity allows for premium pricing");
    } else if factors.demand < 0.98 {
        clauses.push("High price sensitivity requires competitive pricing");
    }

    if change_percent.abs() < 2.0 {
        clauses.push("Current pricing is near optimal");
    }

    if clauses.is_empty() {
        "Standard optimization applied".to_string()
    } else {
        clauses.join(REASONING_SEPARATOR)
    }
}
