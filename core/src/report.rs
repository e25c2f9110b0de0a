//! Aggregation over already-computed forecasts and recommendations.
//!
//! RULE: Everything here is a pure reducer. No store access, no
//! randomness, no clock. Category maps are BTreeMaps and "first N"
//! selections carry a stable id tiebreak, so output order never
//! depends on hashing or insertion order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::{
    forecast::{CurvePoint, ForecastRecord, YearDemand},
    num::{round1, round2},
    optimize::PriceRecommendation,
    product::{Category, Product},
    types::{ProductId, Year},
};

/// How many records the overview lists as "recent".
pub const RECENT_FORECAST_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub product_count: usize,
    pub total_demand: i64,
}

/// Dashboard summary of all live forecast records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOverview {
    pub total_products: usize,
    pub total_forecasted_demand: i64,
    pub average_confidence: f64,
    pub forecast_by_category: BTreeMap<Category, CategoryBreakdown>,
    pub recent_forecasts: Vec<ForecastRecord>,
}

impl ForecastOverview {
    /// The canonical zero-valued summary for an empty record set.
    pub fn empty() -> Self {
        Self {
            total_products: 0,
            total_forecasted_demand: 0,
            average_confidence: 0.0,
            forecast_by_category: BTreeMap::new(),
            recent_forecasts: Vec::new(),
        }
    }
}

pub fn forecast_overview(records: &[ForecastRecord]) -> ForecastOverview {
    if records.is_empty() {
        return ForecastOverview::empty();
    }

    let distinct_products: HashSet<ProductId> =
        records.iter().map(|r| r.product_id).collect();
    let total_demand: i64 = records.iter().map(|r| r.total_forecasted_demand).sum();
    let average_confidence =
        records.iter().map(|r| r.confidence_score).sum::<f64>() / records.len() as f64;

    let mut by_category: BTreeMap<Category, CategoryBreakdown> = BTreeMap::new();
    for record in records {
        let entry = by_category.entry(record.product_category).or_default();
        entry.product_count += 1;
        entry.total_demand += record.total_forecasted_demand;
    }

    // Most recent first; id is the stable tiebreak for equal
    // timestamps.
    let mut by_recency: Vec<&ForecastRecord> = records.iter().collect();
    by_recency.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    ForecastOverview {
        total_products: distinct_products.len(),
        total_forecasted_demand: total_demand,
        average_confidence: round2(average_confidence),
        forecast_by_category: by_category,
        recent_forecasts: by_recency
            .into_iter()
            .take(RECENT_FORECAST_LIMIT)
            .cloned()
            .collect(),
    }
}

/// Batch-level view of a set of price recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub total_products: usize,
    pub products_with_increases: usize,
    pub products_with_decreases: usize,
    pub avg_confidence_score: f64,
    pub total_current_revenue: f64,
    pub potential_revenue_increase: f64,
    pub revenue_impact_percent: f64,
}

pub fn optimization_summary(recommendations: &[PriceRecommendation]) -> OptimizationSummary {
    let avg_confidence = if recommendations.is_empty() {
        0.0
    } else {
        round1(
            recommendations
                .iter()
                .map(|r| r.confidence_score)
                .sum::<f64>()
                / recommendations.len() as f64,
        )
    };

    let mut total_current_revenue = 0.0;
    let mut potential_increase = 0.0;
    for rec in recommendations {
        let units = rec.units_sold as f64;
        total_current_revenue += rec.original_price * units;
        potential_increase += (rec.optimized_price - rec.original_price) * units;
    }

    OptimizationSummary {
        total_products: recommendations.len(),
        products_with_increases: recommendations
            .iter()
            .filter(|r| r.price_change > 0.0)
            .count(),
        products_with_decreases: recommendations
            .iter()
            .filter(|r| r.price_change < 0.0)
            .count(),
        avg_confidence_score: avg_confidence,
        total_current_revenue: round2(total_current_revenue),
        potential_revenue_increase: round2(potential_increase),
        // The 0.01 floor keeps an empty or zero-revenue catalog from
        // dividing by zero.
        revenue_impact_percent: round2(
            potential_increase / total_current_revenue.max(0.01) * 100.0,
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationPotential {
    pub overpriced_count: usize,
    pub underpriced_count: usize,
    pub optimal_count: usize,
}

/// Price positioning of one category relative to its own average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub product_count: usize,
    pub price_stats: PriceStats,
    pub optimization_potential: OptimizationPotential,
}

/// Per-category price statistics over the active catalog. Products
/// priced above 1.2x their category average count as overpriced,
/// below 0.8x as underpriced. Empty categories are omitted.
pub fn market_analysis(products: &[Product]) -> BTreeMap<Category, CategoryAnalysis> {
    let mut by_category: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
    for product in products {
        by_category
            .entry(product.category)
            .or_default()
            .push(product.current_price);
    }

    by_category
        .into_iter()
        .map(|(category, mut prices)| {
            prices.sort_by(|a, b| a.total_cmp(b));
            let count = prices.len();
            let avg = prices.iter().sum::<f64>() / count as f64;

            let overpriced = prices.iter().filter(|&&p| p > avg * 1.2).count();
            let underpriced = prices.iter().filter(|&&p| p < avg * 0.8).count();

            let analysis = CategoryAnalysis {
                product_count: count,
                price_stats: PriceStats {
                    min: round2(prices[0]),
                    max: round2(prices[count - 1]),
                    avg: round2(avg),
                    median: round2(prices[count / 2]),
                },
                optimization_potential: OptimizationPotential {
                    overpriced_count: overpriced,
                    underpriced_count: underpriced,
                    optimal_count: count - overpriced - underpriced,
                },
            };
            (category, analysis)
        })
        .collect()
}

/// One product's chart series: demand aligned over the shared year
/// axis (zero-filled where the forecast has no entry) plus its
/// demand/price curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSeries {
    pub product_id: ProductId,
    pub product_name: String,
    pub demand_by_year: Vec<YearDemand>,
    pub curve_data: Vec<CurvePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub years: Vec<Year>,
    pub series: Vec<ProductSeries>,
}

/// Shape up to `limit` forecast records for line charts: one demand
/// series per product over the sorted union of forecast years.
pub fn chart_data(records: &[ForecastRecord], limit: usize) -> ChartData {
    let selected: Vec<&ForecastRecord> = records.iter().take(limit).collect();

    let mut years: Vec<Year> = selected
        .iter()
        .flat_map(|r| r.forecast_data.iter().map(|y| y.year))
        .collect();
    years.sort_unstable();
    years.dedup();

    let series = selected
        .iter()
        .map(|record| {
            let demand_by_year = years
                .iter()
                .map(|&year| YearDemand {
                    year,
                    demand: record
                        .forecast_data
                        .iter()
                        .find(|y| y.year == year)
                        .map_or(0, |y| y.demand),
                })
                .collect();
            ProductSeries {
                product_id: record.product_id,
                product_name: record.product_name.clone(),
                demand_by_year,
                curve_data: record.demand_price_curve.clone(),
            }
        })
        .collect();

    ChartData { years, series }
}
