//! pricing-runner: headless catalog runner for the pricing engine.
//!
//! Usage:
//!   pricing-runner --seed 42 --db catalog.db --data-dir ./data
//!   pricing-runner --seed 42 --years 5 --method historical_simulation
//!   pricing-runner --seed 42 --apply --reason "Quarterly optimization"

use anyhow::Result;
use pricecast_core::{
    config::EngineConfig,
    engine::{OptimizationBatch, PricingEngine},
    forecast::{ForecastMethod, ForecastRecord},
    product::Product,
    store::EngineStore,
    types::ProductId,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let years = parse_arg(&args, "--years", 5u32);
    let apply = args.iter().any(|a| a == "--apply");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");
    let method_arg = args
        .windows(2)
        .find(|w| w[0] == "--method")
        .map(|w| w[1].as_str())
        .unwrap_or("historical_simulation");
    let reason = args
        .windows(2)
        .find(|w| w[0] == "--reason")
        .map(|w| w[1].as_str())
        .unwrap_or("Price optimization applied");

    let method = ForecastMethod::parse(method_arg).unwrap_or_else(|| {
        log::warn!("unknown method '{method_arg}', using historical_simulation");
        ForecastMethod::HistoricalSimulation
    });

    println!("pricecast — pricing-runner");
    println!("  seed:      {seed}");
    println!("  years:     {years}");
    println!("  method:    {}", method.as_str());
    println!("  db:        {db}");
    println!("  data_dir:  {data_dir}");
    println!("  started:   {}", chrono::Utc::now().to_rfc3339());
    println!();

    let store = if db == ":memory:" {
        EngineStore::in_memory()?
    } else {
        EngineStore::open(db)?
    };
    store.migrate()?;

    let config = EngineConfig::load(data_dir)?;
    let engine = PricingEngine::new(config, store, seed);

    let catalog = load_catalog(data_dir)?;
    let mut ids: Vec<ProductId> = Vec::with_capacity(catalog.len());
    for product in &catalog {
        ids.push(engine.store().upsert_product(product)?);
    }
    log::info!("catalog: seeded {} products from {data_dir}", ids.len());

    let forecasts = engine.generate_forecasts(&ids, method, years, Some("pricing-runner"))?;
    let batch = engine.optimize_all()?;

    if apply {
        let applied = engine.apply_optimization(&ids, reason, "pricing-runner")?;
        println!("=== APPLIED CHANGES ===");
        if applied.is_empty() {
            println!("  (No changes above the minimum threshold)");
        }
        for change in &applied {
            println!(
                "  {:<28} ${:>8.2} -> ${:>8.2}  ({:+.2})",
                change.name, change.old_price, change.new_price, change.change
            );
        }
        println!();
    }

    print_summary(&engine, &forecasts, &batch)?;
    Ok(())
}

fn load_catalog(data_dir: &str) -> Result<Vec<Product>> {
    #[derive(serde::Deserialize)]
    struct CatalogFile {
        products: Vec<Product>,
    }

    let path = format!("{data_dir}/catalog.json");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let file: CatalogFile = serde_json::from_str(&content)?;
    Ok(file.products)
}

fn print_summary(
    engine: &PricingEngine,
    forecasts: &[ForecastRecord],
    batch: &OptimizationBatch,
) -> Result<()> {
    let overview = engine.forecast_overview()?;

    println!("=== FORECAST OVERVIEW ===");
    println!("  products:         {}", overview.total_products);
    println!("  total demand:     {}", overview.total_forecasted_demand);
    println!("  avg confidence:   {:.2}", overview.average_confidence);
    for (category, breakdown) in &overview.forecast_by_category {
        println!(
            "  {:<12} {:>3} products | demand {}",
            category.as_str(),
            breakdown.product_count,
            breakdown.total_demand
        );
    }
    if let Some(record) = forecasts.first() {
        println!(
            "  horizon:          {}..{}",
            record.start_year, record.end_year
        );
    }

    println!();
    println!("=== OPTIMIZATION SUMMARY ===");
    let summary = &batch.summary;
    println!("  products:         {}", summary.total_products);
    println!("  increases:        {}", summary.products_with_increases);
    println!("  decreases:        {}", summary.products_with_decreases);
    println!("  avg confidence:   {:.1}", summary.avg_confidence_score);
    println!("  current revenue:  ${:.2}", summary.total_current_revenue);
    println!(
        "  potential delta:  ${:.2} ({:+.2}%)",
        summary.potential_revenue_increase, summary.revenue_impact_percent
    );

    println!();
    println!("=== TOP MOVES ===");
    let mut moves: Vec<_> = batch.recommendations.iter().collect();
    moves.sort_by(|a, b| {
        b.price_change
            .abs()
            .total_cmp(&a.price_change.abs())
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    for rec in moves.iter().take(5) {
        println!(
            "  {:<28} ${:>8.2} -> ${:>8.2} ({:+.1}%, conf {:.0})",
            rec.name,
            rec.original_price,
            rec.optimized_price,
            rec.price_change_percent,
            rec.confidence_score
        );
        println!("      {}", rec.reasoning);
    }

    println!();
    println!("=== MARKET ANALYSIS ===");
    for (category, analysis) in engine.market_analysis()? {
        println!(
            "  {:<12} {:>3} products | avg ${:.2} median ${:.2} | {} over / {} under / {} optimal",
            category.as_str(),
            analysis.product_count,
            analysis.price_stats.avg,
            analysis.price_stats.median,
            analysis.optimization_potential.overpriced_count,
            analysis.optimization_potential.underpriced_count,
            analysis.optimization_potential.optimal_count
        );
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
