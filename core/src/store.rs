//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database. Engine operations call
//! store methods — they never execute SQL directly.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    error::EngineResult,
    forecast::{ForecastMethod, ForecastRecord},
    product::{Category, PriceHistoryEntry, Product},
    types::{ProductId, Year},
};

pub struct EngineStore {
    conn: Connection,
}

impl EngineStore {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_catalog.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_forecasts.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_price_history.sql"))?;
        Ok(())
    }

    // ── Catalog ────────────────────────────────────────────────

    /// Insert or update a product, keyed by sku. Returns the row id.
    pub fn upsert_product(&self, product: &Product) -> EngineResult<ProductId> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO product (
                sku, name, category, base_price, current_price,
                stock_qty, units_sold, customer_rating, demand_forecast,
                elasticity, is_active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(sku) DO UPDATE SET
                name            = excluded.name,
                category        = excluded.category,
                base_price      = excluded.base_price,
                current_price   = excluded.current_price,
                stock_qty       = excluded.stock_qty,
                units_sold      = excluded.units_sold,
                customer_rating = excluded.customer_rating,
                demand_forecast = excluded.demand_forecast,
                elasticity      = excluded.elasticity,
                is_active       = excluded.is_active,
                updated_at      = excluded.updated_at",
            params![
                product.sku,
                product.name,
                product.category.as_str(),
                product.base_price,
                product.current_price,
                product.stock_qty as i64,
                product.units_sold as i64,
                product.customer_rating as i64,
                product.demand_forecast as i64,
                product.elasticity,
                product.is_active as i64,
                now,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM product WHERE sku = ?1",
            params![product.sku],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn product(&self, id: ProductId) -> EngineResult<Option<Product>> {
        self.conn
            .query_row(
                "SELECT id, sku, name, category, base_price, current_price,
                        stock_qty, units_sold, customer_rating,
                        demand_forecast, elasticity, is_active
                 FROM product WHERE id = ?1",
                params![id],
                read_product_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Active products matching the supplied ids, first occurrence
    /// wins on duplicates. Missing and inactive ids are skipped.
    pub fn products_by_ids(&self, ids: &[ProductId]) -> EngineResult<Vec<Product>> {
        let mut seen = std::collections::HashSet::new();
        let mut products = Vec::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if let Some(product) = self.product(id)? {
                if product.is_active {
                    products.push(product);
                }
            }
        }
        Ok(products)
    }

    /// All active products in id order.
    pub fn active_products(&self) -> EngineResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sku, name, category, base_price, current_price,
                    stock_qty, units_sold, customer_rating,
                    demand_forecast, elasticity, is_active
             FROM product WHERE is_active = 1
             ORDER BY id ASC",
        )?;
        let products = stmt
            .query_map([], read_product_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    // ── Forecasts ──────────────────────────────────────────────

    /// Atomic replace: at most one live forecast per (product,
    /// method). An existing record keeps its creation timestamp;
    /// everything else is overwritten. Returns (id, created_at) of
    /// the live row.
    pub fn replace_forecast(
        &self,
        record: &ForecastRecord,
    ) -> EngineResult<(i64, DateTime<Utc>)> {
        let forecast_data = serde_json::to_string(&record.forecast_data)?;
        let demand_price_curve = serde_json::to_string(&record.demand_price_curve)?;

        self.conn.execute(
            "INSERT INTO demand_forecast (
                product_id, forecast_method, version, start_year, end_year,
                forecast_data, demand_price_curve, total_forecasted_demand,
                confidence_score, created_by, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             ON CONFLICT(product_id, forecast_method) DO UPDATE SET
                version                 = excluded.version,
                start_year              = excluded.start_year,
                end_year                = excluded.end_year,
                forecast_data           = excluded.forecast_data,
                demand_price_curve      = excluded.demand_price_curve,
                total_forecasted_demand = excluded.total_forecasted_demand,
                confidence_score        = excluded.confidence_score,
                created_by              = excluded.created_by,
                updated_at              = excluded.updated_at",
            params![
                record.product_id,
                record.forecast_method.as_str(),
                record.version as i64,
                record.start_year as i64,
                record.end_year as i64,
                forecast_data,
                demand_price_curve,
                record.total_forecasted_demand,
                record.confidence_score,
                record.created_by,
                record.created_at,
            ],
        )?;

        let row = self.conn.query_row(
            "SELECT id, created_at FROM demand_forecast
             WHERE product_id = ?1 AND forecast_method = ?2",
            params![record.product_id, record.forecast_method.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(row)
    }

    /// All forecast records, joined with their product for name and
    /// category, in id order.
    pub fn forecasts_all(&self) -> EngineResult<Vec<ForecastRecord>> {
        self.query_forecasts(
            "SELECT f.id, f.product_id, p.name, p.category, f.forecast_method,
                    f.version, f.start_year, f.end_year, f.forecast_data,
                    f.demand_price_curve, f.total_forecasted_demand,
                    f.confidence_score, f.created_by, f.created_at
             FROM demand_forecast f
             JOIN product p ON p.id = f.product_id
             ORDER BY f.id ASC",
            params![],
        )
    }

    /// Forecast records for one product, in id order.
    pub fn forecasts_for_product(
        &self,
        product_id: ProductId,
    ) -> EngineResult<Vec<ForecastRecord>> {
        self.query_forecasts(
            "SELECT f.id, f.product_id, p.name, p.category, f.forecast_method,
                    f.version, f.start_year, f.end_year, f.forecast_data,
                    f.demand_price_curve, f.total_forecasted_demand,
                    f.confidence_score, f.created_by, f.created_at
             FROM demand_forecast f
             JOIN product p ON p.id = f.product_id
             WHERE f.product_id = ?1
             ORDER BY f.id ASC",
            params![product_id],
        )
    }

    fn query_forecasts<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> EngineResult<Vec<ForecastRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_forecast_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ForecastRow::into_record).collect()
    }

    // ── Price history ──────────────────────────────────────────

    /// Update the stored current price and append the audit entry in
    /// one transaction.
    pub fn apply_price_change(&self, entry: &PriceHistoryEntry) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE product SET current_price = ?1, updated_at = ?2 WHERE id = ?3",
            params![entry.new_price, entry.changed_at, entry.product_id],
        )?;
        tx.execute(
            "INSERT INTO price_history (
                id, product_id, old_price, new_price, changed_by, reason, changed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.product_id,
                entry.old_price,
                entry.new_price,
                entry.changed_by,
                entry.reason,
                entry.changed_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// A product's price changes, most recent first.
    pub fn price_history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> EngineResult<Vec<PriceHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, old_price, new_price, changed_by, reason, changed_at
             FROM price_history
             WHERE product_id = ?1
             ORDER BY changed_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![product_id, limit as i64], |row| {
                Ok(PriceHistoryEntry {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    old_price: row.get(2)?,
                    new_price: row.get(3)?,
                    changed_by: row.get(4)?,
                    reason: row.get(5)?,
                    changed_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn read_product_row(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        category: Category::parse(&row.get::<_, String>(3)?),
        base_price: row.get(4)?,
        current_price: row.get(5)?,
        stock_qty: row.get::<_, i64>(6)? as u32,
        units_sold: row.get::<_, i64>(7)? as u32,
        customer_rating: row.get::<_, i64>(8)? as u8,
        demand_forecast: row.get::<_, i64>(9)? as u32,
        elasticity: row.get(10)?,
        is_active: row.get::<_, i64>(11)? != 0,
    })
}

/// Raw forecast row; JSON columns are parsed in a second step so the
/// rusqlite row closure stays infallible on the serde side.
struct ForecastRow {
    id: i64,
    product_id: ProductId,
    product_name: String,
    category: String,
    method: String,
    version: i64,
    start_year: i64,
    end_year: i64,
    forecast_data: String,
    demand_price_curve: String,
    total_forecasted_demand: i64,
    confidence_score: f64,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

fn read_forecast_row(row: &Row) -> rusqlite::Result<ForecastRow> {
    Ok(ForecastRow {
        id: row.get(0)?,
        product_id: row.get(1)?,
        product_name: row.get(2)?,
        category: row.get(3)?,
        method: row.get(4)?,
        version: row.get(5)?,
        start_year: row.get(6)?,
        end_year: row.get(7)?,
        forecast_data: row.get(8)?,
        demand_price_curve: row.get(9)?,
        total_forecasted_demand: row.get(10)?,
        confidence_score: row.get(11)?,
        created_by: row.get(12)?,
        created_at: row.get(13)?,
    })
}

impl ForecastRow {
    fn into_record(self) -> EngineResult<ForecastRecord> {
        Ok(ForecastRecord {
            id: Some(self.id),
            product_id: self.product_id,
            product_name: self.product_name,
            product_category: Category::parse(&self.category),
            forecast_method: ForecastMethod::parse(&self.method).unwrap_or_default(),
            version: self.version as u32,
            start_year: self.start_year as Year,
            end_year: self.end_year as Year,
            forecast_data: serde_json::from_str(&self.forecast_data)?,
            demand_price_curve: serde_json::from_str(&self.demand_price_curve)?,
            total_forecasted_demand: self.total_forecasted_demand,
            confidence_score: self.confidence_score,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}
