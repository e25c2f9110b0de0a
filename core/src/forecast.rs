//! Demand forecasting — the historical simulation and the
//! demand/price curve.
//!
//! Both computations are pure functions of a product snapshot, the
//! policy tables, and (for the volatile growth branch) a caller-
//! supplied deterministic RNG stream. Nothing here touches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::{EngineConfig, GrowthModel},
    num::round2,
    product::{Category, Product},
    rng::ProductRng,
    types::{ProductId, Year},
};

/// Points on the demand/price curve: 0.5x to 1.5x of the current
/// price in 0.1 steps.
const CURVE_POINTS: usize = 11;

/// Valid forecast horizon, in years.
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    #[default]
    HistoricalSimulation,
    PriceElasticity,
    TrendAnalysis,
}

impl ForecastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HistoricalSimulation => "historical_simulation",
            Self::PriceElasticity => "price_elasticity",
            Self::TrendAnalysis => "trend_analysis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "historical_simulation" => Some(Self::HistoricalSimulation),
            "price_elasticity" => Some(Self::PriceElasticity),
            "trend_analysis" => Some(Self::TrendAnalysis),
            _ => None,
        }
    }
}

/// Projected demand for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDemand {
    pub year: Year,
    pub demand: i64,
}

/// One point on the demand/price curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub price: f64,
    pub demand: i64,
}

/// A complete forecast for one (product, method) pair. At most one
/// live record exists per pair; regeneration replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub id: Option<i64>,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_category: Category,
    pub forecast_method: ForecastMethod,
    pub version: u32,
    pub start_year: Year,
    pub end_year: Year,
    pub forecast_data: Vec<YearDemand>,
    pub demand_price_curve: Vec<CurvePoint>,
    pub total_forecasted_demand: i64,
    pub confidence_score: f64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct ForecastGenerator<'a> {
    config: &'a EngineConfig,
    current_year: Year,
}

impl<'a> ForecastGenerator<'a> {
    pub fn new(config: &'a EngineConfig, current_year: Year) -> Self {
        Self {
            config,
            current_year,
        }
    }

    /// Base demand: the prior estimate when present, else a fraction
    /// of lifetime units sold, else the configured floor. First
    /// nonzero wins, in that order.
    fn base_demand(&self, product: &Product) -> f64 {
        let params = &self.config.forecast;
        if product.demand_forecast > 0 {
            product.demand_forecast as f64
        } else if product.units_sold > 0 {
            product.units_sold as f64 * params.sold_to_demand_ratio
        } else {
            params.default_base_demand
        }
    }

    /// Simulate demand for the `years` calendar years ending at the
    /// current year minus one. Total over valid input; callers
    /// validate `years` against [MIN_YEARS, MAX_YEARS].
    pub fn historical_simulation(
        &self,
        product: &Product,
        years: u32,
        rng: &mut ProductRng,
    ) -> Vec<YearDemand> {
        let base_demand = self.base_demand(product);
        let policy = self.config.policy_for(product.category);
        let params = &self.config.forecast;
        let start_year = self.current_year - years as Year;

        (0..years)
            .map(|i| {
                let growth_factor = match policy.growth {
                    GrowthModel::DecayingBoost { amplitude, decay } => {
                        1.0 + amplitude * (-decay * i as f64).exp()
                    }
                    GrowthModel::Linear { rate } => 1.0 + rate * i as f64,
                    GrowthModel::Volatile { rate, jitter } => {
                        1.0 + rate * i as f64 + rng.uniform(-jitter, jitter)
                    }
                };

                let seasonal_factor = 1.0
                    + params.seasonal_amplitude
                        * (i as f64 * 2.0 * std::f64::consts::PI / params.seasonal_period)
                            .sin();

                let demand = (base_demand * growth_factor * seasonal_factor) as i64;
                YearDemand {
                    year: start_year + i as Year,
                    demand: demand.max(0),
                }
            })
            .collect()
    }

    /// Discretized demand-vs-price curve around the current price.
    /// Always exactly CURVE_POINTS points with monotonically
    /// increasing prices.
    pub fn demand_price_curve(&self, product: &Product) -> Vec<CurvePoint> {
        let base_price = product.current_price;
        let base_demand = self.base_demand(product);
        let elasticity = self.config.policy_for(product.category).curve_elasticity;

        (0..CURVE_POINTS)
            .map(|i| {
                let price_multiplier = 0.5 + 0.1 * i as f64;
                // price_multiplier IS the price ratio, so the demand
                // relation uses it directly; only the reported price
                // is rounded.
                let demand = (base_demand * price_multiplier.powf(elasticity)) as i64;
                CurvePoint {
                    price: round2(base_price * price_multiplier),
                    demand: demand.max(0),
                }
            })
            .collect()
    }

    /// Run the requested method and assemble the full record.
    ///
    /// Only the historical simulation is implemented; the other two
    /// accepted methods fall back to it, loudly. The record keeps the
    /// requested method so the replace key stays caller-visible.
    pub fn build_record(
        &self,
        product: &Product,
        method: ForecastMethod,
        years: u32,
        rng: &mut ProductRng,
        created_by: Option<&str>,
    ) -> ForecastRecord {
        if method != ForecastMethod::HistoricalSimulation {
            log::warn!(
                "forecast: method {} not implemented, falling back to historical_simulation",
                method.as_str()
            );
        }
        let forecast_data = self.historical_simulation(product, years, rng);
        let demand_price_curve = self.demand_price_curve(product);
        let total_forecasted_demand = forecast_data.iter().map(|y| y.demand).sum();

        ForecastRecord {
            id: None,
            product_id: product.id,
            product_name: product.name.clone(),
            product_category: product.category,
            forecast_method: method,
            version: 1,
            start_year: self.current_year - years as Year,
            end_year: self.current_year - 1,
            forecast_data,
            demand_price_curve,
            total_forecasted_demand,
            confidence_score: self.config.forecast.confidence,
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}
