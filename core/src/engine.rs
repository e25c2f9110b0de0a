//! The engine facade — policy tables, store, and the seeded RNG bank
//! wired behind the request-shaped operations collaborators call.
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - Forecast persistence is an atomic replace per (product, method).
//!   - Optimizing a single product never raises; degraded results
//!     carry confidence 0 and an error description.
//!   - Input validation happens here, once, at the boundary.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    error::{EngineError, EngineResult},
    forecast::{ForecastGenerator, ForecastMethod, ForecastRecord, MAX_YEARS, MIN_YEARS},
    num::round2,
    optimize::{PriceOptimizer, PriceRecommendation},
    product::{Category, PriceHistoryEntry, Product},
    report::{
        self, CategoryAnalysis, ChartData, ForecastOverview, OptimizationSummary,
    },
    rng::RngBank,
    store::EngineStore,
    types::{ProductId, Year},
};

/// How many products a chart request plots at once.
const CHART_PRODUCT_LIMIT: usize = 4;

/// A full optimization pass: per-product recommendations plus the
/// batch rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationBatch {
    pub recommendations: Vec<PriceRecommendation>,
    pub summary: OptimizationSummary,
}

/// One applied price change, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub product_id: ProductId,
    pub name: String,
    pub old_price: f64,
    pub new_price: f64,
    pub change: f64,
}

pub struct PricingEngine {
    config: EngineConfig,
    store: EngineStore,
    rng_bank: RngBank,
    current_year: Year,
}

impl PricingEngine {
    pub fn new(config: EngineConfig, store: EngineStore, seed: u64) -> Self {
        Self {
            config,
            store,
            rng_bank: RngBank::new(seed),
            current_year: Utc::now().year(),
        }
    }

    /// Pin the current year. Tests use this so year ranges do not
    /// drift with the wall clock.
    pub fn with_current_year(mut self, year: Year) -> Self {
        self.current_year = year;
        self
    }

    /// Fully wired engine over an in-memory store with the built-in
    /// policy tables and a pinned year. Used by tests.
    pub fn build_test(seed: u64) -> EngineResult<Self> {
        let store = EngineStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(EngineConfig::default_test(), store, seed).with_current_year(2025))
    }

    pub fn store(&self) -> &EngineStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    // ── Forecasting ────────────────────────────────────────────

    /// Generate and persist forecasts for the given products. Each
    /// (product, method) record atomically replaces any prior one.
    pub fn generate_forecasts(
        &self,
        product_ids: &[ProductId],
        method: ForecastMethod,
        years: u32,
        created_by: Option<&str>,
    ) -> EngineResult<Vec<ForecastRecord>> {
        if product_ids.is_empty() {
            return Err(EngineError::EmptyProductSet);
        }
        if !(MIN_YEARS..=MAX_YEARS).contains(&years) {
            return Err(EngineError::InvalidYears { years });
        }

        let products = self.store.products_by_ids(product_ids)?;
        if products.is_empty() {
            return Err(EngineError::NoProductsMatched);
        }

        let generator = ForecastGenerator::new(&self.config, self.current_year);
        let mut records = Vec::with_capacity(products.len());
        for product in &products {
            let mut rng = self.rng_bank.for_product(product.id);
            let mut record =
                generator.build_record(product, method, years, &mut rng, created_by);
            let (id, created_at) = self.store.replace_forecast(&record)?;
            record.id = Some(id);
            record.created_at = created_at;
            records.push(record);
        }

        log::info!(
            "forecast: generated {} records (method={}, years={})",
            records.len(),
            method.as_str(),
            years
        );
        Ok(records)
    }

    /// Dashboard summary over every live forecast record.
    pub fn forecast_overview(&self) -> EngineResult<ForecastOverview> {
        let records = self.store.forecasts_all()?;
        Ok(report::forecast_overview(&records))
    }

    /// Chart-ready series for the requested products (all products
    /// when `product_ids` is empty): the most recent record per
    /// product, at most CHART_PRODUCT_LIMIT products.
    pub fn chart_data(&self, product_ids: &[ProductId]) -> EngineResult<ChartData> {
        let mut records = if product_ids.is_empty() {
            self.store.forecasts_all()?
        } else {
            let mut records = Vec::new();
            for &id in product_ids {
                records.extend(self.store.forecasts_for_product(id)?);
            }
            records
        };

        // Newest first with the id tiebreak, then one record per
        // product.
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let mut seen = std::collections::HashSet::new();
        let latest: Vec<ForecastRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.product_id))
            .collect();

        Ok(report::chart_data(&latest, CHART_PRODUCT_LIMIT))
    }

    // ── Optimization ───────────────────────────────────────────

    /// Price recommendations for every active product, in id order,
    /// with the batch summary.
    pub fn optimize_all(&self) -> EngineResult<OptimizationBatch> {
        let products = self.store.active_products()?;
        let optimizer = PriceOptimizer::new(&self.config);
        let recommendations: Vec<PriceRecommendation> =
            products.iter().map(|p| optimizer.optimize(p)).collect();
        let summary = report::optimization_summary(&recommendations);

        log::info!(
            "pricing: optimized {} products ({} up, {} down)",
            summary.total_products,
            summary.products_with_increases,
            summary.products_with_decreases
        );
        Ok(OptimizationBatch {
            recommendations,
            summary,
        })
    }

    /// Recompute and apply optimized prices for the given products.
    /// Changes at or below the configured minimum are skipped as
    /// no-op writes; every applied change lands in the price history.
    pub fn apply_optimization(
        &self,
        product_ids: &[ProductId],
        reason: &str,
        changed_by: &str,
    ) -> EngineResult<Vec<AppliedChange>> {
        if product_ids.is_empty() {
            return Err(EngineError::EmptyProductSet);
        }

        let products = self.store.products_by_ids(product_ids)?;
        let optimizer = PriceOptimizer::new(&self.config);
        let mut applied = Vec::new();

        for product in &products {
            let recommendation = optimizer.optimize(product);
            if recommendation.error.is_some() {
                continue;
            }

            let old_price = product.current_price;
            let new_price = recommendation.optimized_price;
            if (new_price - old_price).abs() <= self.config.optimizer.min_applied_change {
                continue;
            }

            self.store.apply_price_change(&PriceHistoryEntry {
                id: Uuid::new_v4().to_string(),
                product_id: product.id,
                old_price,
                new_price,
                changed_by: changed_by.to_string(),
                reason: reason.to_string(),
                changed_at: Utc::now(),
            })?;

            applied.push(AppliedChange {
                product_id: product.id,
                name: product.name.clone(),
                old_price,
                new_price,
                change: round2(new_price - old_price),
            });
        }

        log::info!(
            "pricing: applied {} of {} requested price changes",
            applied.len(),
            product_ids.len()
        );
        Ok(applied)
    }

    /// Suggested list price for a product that has not been through
    /// an optimization pass yet.
    pub fn initial_price(&self, product: &Product) -> f64 {
        PriceOptimizer::new(&self.config).initial_price(product)
    }

    // ── Reporting ──────────────────────────────────────────────

    /// Per-category price positioning over the active catalog.
    pub fn market_analysis(&self) -> EngineResult<BTreeMap<Category, CategoryAnalysis>> {
        let products = self.store.active_products()?;
        Ok(report::market_analysis(&products))
    }

    /// A product's applied price changes, most recent first.
    pub fn price_history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> EngineResult<Vec<PriceHistoryEntry>> {
        self.store.price_history(product_id, limit)
    }
}
