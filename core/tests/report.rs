use chrono::{TimeZone, Utc};
use pricecast_core::{
    forecast::{CurvePoint, ForecastMethod, ForecastRecord, YearDemand},
    optimize::{PriceFactors, PriceRecommendation},
    product::{Category, Product},
    report,
};

fn record(
    id: i64,
    product_id: i64,
    category: Category,
    total_demand: i64,
    confidence: f64,
    created_minute: u32,
) -> ForecastRecord {
    ForecastRecord {
        id: Some(id),
        product_id,
        product_name: format!("Product {product_id}"),
        product_category: category,
        forecast_method: ForecastMethod::HistoricalSimulation,
        version: 1,
        start_year: 2020,
        end_year: 2024,
        forecast_data: (0..5)
            .map(|i| YearDemand {
                year: 2020 + i,
                demand: total_demand / 5,
            })
            .collect(),
        demand_price_curve: Vec::new(),
        total_forecasted_demand: total_demand,
        confidence_score: confidence,
        created_by: None,
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, created_minute, 0).unwrap(),
    }
}

fn recommendation(
    product_id: i64,
    original: f64,
    optimized: f64,
    units_sold: u32,
    confidence: f64,
) -> PriceRecommendation {
    PriceRecommendation {
        product_id,
        sku: format!("SKU-{product_id}"),
        name: format!("Product {product_id}"),
        category: Category::Other,
        units_sold,
        stock_qty: 100,
        original_price: original,
        optimized_price: optimized,
        price_change: optimized - original,
        price_change_percent: (optimized - original) / original * 100.0,
        factors_applied: PriceFactors::neutral(),
        confidence_score: confidence,
        reasoning: "Standard optimization applied".into(),
        error: None,
    }
}

// ── Forecast overview ──────────────────────────────────────────

#[test]
fn empty_overview_is_the_canonical_zero_summary() {
    let overview = report::forecast_overview(&[]);
    assert_eq!(overview.total_products, 0);
    assert_eq!(overview.total_forecasted_demand, 0);
    assert_eq!(overview.average_confidence, 0.0);
    assert!(overview.forecast_by_category.is_empty());
    assert!(overview.recent_forecasts.is_empty());
}

#[test]
fn overview_counts_distinct_products_and_sums_demand() {
    // Product 1 has two records (one per method key); product 2 one.
    let mut second_method = record(2, 1, Category::Electronics, 400, 0.8, 1);
    second_method.forecast_method = ForecastMethod::TrendAnalysis;

    let records = vec![
        record(1, 1, Category::Electronics, 600, 0.9, 0),
        second_method,
        record(3, 2, Category::Grocery, 1000, 0.7, 2),
    ];

    let overview = report::forecast_overview(&records);
    assert_eq!(overview.total_products, 2);
    assert_eq!(overview.total_forecasted_demand, 2000);
    assert_eq!(overview.average_confidence, 0.8);

    let electronics = &overview.forecast_by_category[&Category::Electronics];
    assert_eq!(electronics.product_count, 2);
    assert_eq!(electronics.total_demand, 1000);
    let grocery = &overview.forecast_by_category[&Category::Grocery];
    assert_eq!(grocery.product_count, 1);
    assert_eq!(grocery.total_demand, 1000);
}

#[test]
fn recent_forecasts_are_newest_first_with_stable_tiebreak() {
    let mut records: Vec<ForecastRecord> = (0..7)
        .map(|i| record(i + 1, i + 1, Category::Other, 100, 0.8, i as u32))
        .collect();
    // Two records share a timestamp; the higher id wins the tie.
    records.push(record(99, 99, Category::Other, 100, 0.8, 6));

    let overview = report::forecast_overview(&records);
    assert_eq!(overview.recent_forecasts.len(), 5);
    assert_eq!(overview.recent_forecasts[0].id, Some(99));
    assert_eq!(overview.recent_forecasts[1].id, Some(7));
    assert_eq!(overview.recent_forecasts[2].id, Some(6));
}

// ── Optimization batch summary ─────────────────────────────────

#[test]
fn empty_batch_summary_has_no_division_by_zero() {
    let summary = report::optimization_summary(&[]);
    assert_eq!(summary.total_products, 0);
    assert_eq!(summary.products_with_increases, 0);
    assert_eq!(summary.products_with_decreases, 0);
    assert_eq!(summary.avg_confidence_score, 0.0);
    assert_eq!(summary.total_current_revenue, 0.0);
    assert_eq!(summary.potential_revenue_increase, 0.0);
    assert_eq!(summary.revenue_impact_percent, 0.0);
}

#[test]
fn batch_summary_aggregates_counts_and_revenue() {
    let recommendations = vec![
        recommendation(1, 10.0, 12.0, 100, 80.0), // +200 on 1000
        recommendation(2, 20.0, 18.0, 50, 75.0),  // -100 on 1000
        recommendation(3, 5.0, 5.0, 0, 85.0),     // no change, no revenue
    ];

    let summary = report::optimization_summary(&recommendations);
    assert_eq!(summary.total_products, 3);
    assert_eq!(summary.products_with_increases, 1);
    assert_eq!(summary.products_with_decreases, 1);
    assert_eq!(summary.avg_confidence_score, 80.0);
    assert_eq!(summary.total_current_revenue, 2000.0);
    assert_eq!(summary.potential_revenue_increase, 100.0);
    assert_eq!(summary.revenue_impact_percent, 5.0);
}

#[test]
fn zero_revenue_batch_uses_the_floor_divisor() {
    // Units sold are all zero: revenue is zero, impact must not blow up.
    let recommendations = vec![recommendation(1, 10.0, 12.0, 0, 80.0)];
    let summary = report::optimization_summary(&recommendations);
    assert_eq!(summary.total_current_revenue, 0.0);
    assert_eq!(summary.revenue_impact_percent, 0.0);
}

// ── Market analysis ────────────────────────────────────────────

fn priced_product(id: i64, category: Category, price: f64) -> Product {
    Product {
        id,
        sku: format!("SKU-{id}"),
        name: format!("Product {id}"),
        category,
        base_price: price / 2.0,
        current_price: price,
        stock_qty: 10,
        units_sold: 10,
        customer_rating: 3,
        demand_forecast: 0,
        elasticity: 1.2,
        is_active: true,
    }
}

#[test]
fn market_analysis_groups_by_category() {
    let products = vec![
        priced_product(1, Category::Electronics, 10.0),
        priced_product(2, Category::Electronics, 20.0),
        priced_product(3, Category::Electronics, 100.0),
        priced_product(4, Category::Grocery, 3.0),
    ];

    let analysis = report::market_analysis(&products);
    assert_eq!(analysis.len(), 2);

    let electronics = &analysis[&Category::Electronics];
    assert_eq!(electronics.product_count, 3);
    assert_eq!(electronics.price_stats.min, 10.0);
    assert_eq!(electronics.price_stats.max, 100.0);
    assert_eq!(electronics.price_stats.avg, 43.33);
    assert_eq!(electronics.price_stats.median, 20.0);

    // avg 43.33: above 1.2x -> 100; below 0.8x -> 10 and 20.
    assert_eq!(electronics.optimization_potential.overpriced_count, 1);
    assert_eq!(electronics.optimization_potential.underpriced_count, 2);
    assert_eq!(electronics.optimization_potential.optimal_count, 0);

    let grocery = &analysis[&Category::Grocery];
    assert_eq!(grocery.product_count, 1);
    assert_eq!(grocery.price_stats.median, 3.0);
    assert_eq!(grocery.optimization_potential.optimal_count, 1);
}

#[test]
fn market_analysis_of_an_empty_catalog_is_empty() {
    assert!(report::market_analysis(&[]).is_empty());
}

// ── Chart data ─────────────────────────────────────────────────

#[test]
fn chart_series_align_over_the_union_of_years() {
    let mut early = record(1, 1, Category::Other, 500, 0.8, 0);
    early.start_year = 2020;
    early.end_year = 2022;
    early.forecast_data = (0..3)
        .map(|i| YearDemand {
            year: 2020 + i,
            demand: 10 + i as i64,
        })
        .collect();

    let mut late = record(2, 2, Category::Other, 500, 0.8, 1);
    late.start_year = 2022;
    late.end_year = 2024;
    late.forecast_data = (0..3)
        .map(|i| YearDemand {
            year: 2022 + i,
            demand: 20 + i as i64,
        })
        .collect();
    late.demand_price_curve = vec![CurvePoint {
        price: 1.0,
        demand: 1,
    }];

    let chart = report::chart_data(&[early, late], 4);
    assert_eq!(chart.years, vec![2020, 2021, 2022, 2023, 2024]);
    assert_eq!(chart.series.len(), 2);

    let first = &chart.series[0];
    let demands: Vec<i64> = first.demand_by_year.iter().map(|y| y.demand).collect();
    assert_eq!(demands, vec![10, 11, 12, 0, 0], "gaps must be zero-filled");

    let second = &chart.series[1];
    let demands: Vec<i64> = second.demand_by_year.iter().map(|y| y.demand).collect();
    assert_eq!(demands, vec![0, 0, 20, 21, 22]);
    assert_eq!(second.curve_data.len(), 1);
}

#[test]
fn chart_data_caps_the_number_of_series() {
    let records: Vec<ForecastRecord> = (0..6)
        .map(|i| record(i + 1, i + 1, Category::Other, 100, 0.8, i as u32))
        .collect();
    let chart = report::chart_data(&records, 4);
    assert_eq!(chart.series.len(), 4);
}
