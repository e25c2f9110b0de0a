use pricecast_core::{
    engine::PricingEngine,
    forecast::ForecastMethod,
    product::{Category, Product},
};

fn fast_mover() -> Product {
    Product {
        id: 0,
        sku: "ELC-0001".into(),
        name: "Aurora 27in Monitor".into(),
        category: Category::Electronics,
        base_price: 60.0,
        current_price: 100.0,
        stock_qty: 1000,
        units_sold: 5000,
        customer_rating: 4,
        demand_forecast: 0,
        elasticity: 1.2,
        is_active: true,
    }
}

fn neutral_product() -> Product {
    Product {
        id: 0,
        sku: "OTH-0001".into(),
        name: "Canvas Utility Apron".into(),
        category: Category::Other,
        base_price: 9.5,
        current_price: 24.0,
        stock_qty: 100,
        units_sold: 100,
        customer_rating: 3,
        demand_forecast: 0,
        elasticity: 1.2,
        is_active: true,
    }
}

// ── Forecast replace semantics ─────────────────────────────────

#[test]
fn regenerating_replaces_the_prior_record_for_the_method() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&fast_mover()).unwrap();

    let first = engine
        .generate_forecasts(&[id], ForecastMethod::HistoricalSimulation, 3, None)
        .unwrap();
    let second = engine
        .generate_forecasts(&[id], ForecastMethod::HistoricalSimulation, 5, None)
        .unwrap();

    let stored = engine.store().forecasts_all().unwrap();
    assert_eq!(stored.len(), 1, "at most one live forecast per method");
    assert_eq!(stored[0].forecast_data.len(), 5, "latest data must win");
    assert_eq!(stored[0].id, first[0].id, "the row is replaced, not appended");
    assert_eq!(
        second[0].created_at, first[0].created_at,
        "replacement keeps the original creation timestamp"
    );
}

#[test]
fn each_method_keeps_its_own_record() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&fast_mover()).unwrap();

    engine
        .generate_forecasts(&[id], ForecastMethod::HistoricalSimulation, 3, None)
        .unwrap();
    engine
        .generate_forecasts(&[id], ForecastMethod::TrendAnalysis, 3, None)
        .unwrap();

    let stored = engine.store().forecasts_all().unwrap();
    assert_eq!(stored.len(), 2);
}

#[test]
fn forecast_round_trips_through_the_store() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&fast_mover()).unwrap();

    let generated = engine
        .generate_forecasts(&[id], ForecastMethod::HistoricalSimulation, 4, None)
        .unwrap();
    let stored = engine.store().forecasts_all().unwrap();

    assert_eq!(stored[0].forecast_data, generated[0].forecast_data);
    assert_eq!(stored[0].demand_price_curve, generated[0].demand_price_curve);
    assert_eq!(
        stored[0].total_forecasted_demand,
        generated[0].total_forecasted_demand
    );
    assert_eq!(stored[0].product_name, "Aurora 27in Monitor");
    assert_eq!(stored[0].product_category, Category::Electronics);
}

// ── Catalog upserts ────────────────────────────────────────────

#[test]
fn upserting_the_same_sku_updates_in_place() {
    let engine = PricingEngine::build_test(42).unwrap();

    let first_id = engine.store().upsert_product(&fast_mover()).unwrap();
    let mut updated = fast_mover();
    updated.current_price = 120.0;
    let second_id = engine.store().upsert_product(&updated).unwrap();

    assert_eq!(first_id, second_id);
    let product = engine.store().product(first_id).unwrap().unwrap();
    assert_eq!(product.current_price, 120.0);
    assert_eq!(engine.store().active_products().unwrap().len(), 1);
}

// ── Apply + price history ──────────────────────────────────────

#[test]
fn applying_an_optimization_writes_the_price_and_the_history() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&fast_mover()).unwrap();

    let applied = engine
        .apply_optimization(&[id], "Quarterly optimization", "analyst")
        .unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].old_price, 100.0);
    assert_eq!(applied[0].new_price, 105.0);
    assert_eq!(applied[0].change, 5.0);

    let product = engine.store().product(id).unwrap().unwrap();
    assert_eq!(product.current_price, 105.0);

    let history = engine.price_history(id, 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_price, 100.0);
    assert_eq!(history[0].new_price, 105.0);
    assert_eq!(history[0].changed_by, "analyst");
    assert_eq!(history[0].reason, "Quarterly optimization");
}

#[test]
fn history_is_append_only_and_newest_first() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&fast_mover()).unwrap();

    engine.apply_optimization(&[id], "first pass", "analyst").unwrap();
    // Still a fast mover at 105: the second pass moves it again.
    let second = engine.apply_optimization(&[id], "second pass", "analyst").unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].old_price, 105.0);
    assert_eq!(second[0].new_price, 110.25);

    let history = engine.price_history(id, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reason, "second pass");
    assert_eq!(history[1].reason, "first pass");
    assert_eq!(history[1].new_price, history[0].old_price);
}

#[test]
fn changes_below_the_threshold_are_not_written() {
    let engine = PricingEngine::build_test(42).unwrap();
    let id = engine.store().upsert_product(&neutral_product()).unwrap();

    let applied = engine
        .apply_optimization(&[id], "no-op pass", "analyst")
        .unwrap();
    assert!(applied.is_empty());

    let product = engine.store().product(id).unwrap().unwrap();
    assert_eq!(product.current_price, 24.0);
    assert!(engine.price_history(id, 10).unwrap().is_empty());
}

#[test]
fn degraded_products_are_skipped_by_apply() {
    let engine = PricingEngine::build_test(42).unwrap();
    let mut broken = neutral_product();
    broken.sku = "OTH-0002".into();
    broken.current_price = 0.0;
    let id = engine.store().upsert_product(&broken).unwrap();

    let applied = engine.apply_optimization(&[id], "pass", "analyst").unwrap();
    assert!(applied.is_empty());
    assert!(engine.price_history(id, 10).unwrap().is_empty());
}

// ── Engine-level reporting over the store ──────────────────────

#[test]
fn overview_and_chart_reflect_the_stored_records() {
    let engine = PricingEngine::build_test(42).unwrap();
    let fast = engine.store().upsert_product(&fast_mover()).unwrap();
    let neutral = engine.store().upsert_product(&neutral_product()).unwrap();

    engine
        .generate_forecasts(&[fast, neutral], ForecastMethod::HistoricalSimulation, 3, None)
        .unwrap();

    let overview = engine.forecast_overview().unwrap();
    assert_eq!(overview.total_products, 2);
    assert_eq!(overview.recent_forecasts.len(), 2);
    assert!(overview.total_forecasted_demand > 0);

    let chart = engine.chart_data(&[]).unwrap();
    assert_eq!(chart.series.len(), 2);
    assert_eq!(chart.years, vec![2022, 2023, 2024]);

    // Two method records for one product still chart as one series.
    engine
        .generate_forecasts(&[fast], ForecastMethod::PriceElasticity, 3, None)
        .unwrap();
    let chart = engine.chart_data(&[fast]).unwrap();
    assert_eq!(chart.series.len(), 1);
}
