use merx_catalog::{Product, ProductStatus, StockCounters, Variant};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct VariantRow {
    id: Uuid,
    product_id: Uuid,
    sku: String,
    attributes: Option<serde_json::Value>,
    base_price: Decimal,
    stock_quantity: i64,
    reserved_quantity: i64,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            id: row.id,
            product_id: row.product_id,
            sku: row.sku,
            attributes: row.attributes,
            base_price: row.base_price,
            stock_quantity: row.stock_quantity,
            reserved_quantity: row.reserved_quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    base_price: Decimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            status: ProductStatus::from_db(&row.status),
            base_price: row.base_price,
        }
    }
}

const VARIANT_SELECT: &str = r#"
    SELECT v.id, v.product_id, v.sku, v.attributes, p.base_price,
           v.stock_quantity, v.reserved_quantity
    FROM variants v
    JOIN products p ON p.id = v.product_id
    WHERE v.id = $1
"#;

/// Load a variant row and take the exclusive lock on it. The lock is held
/// until the surrounding transaction commits or rolls back, serializing all
/// counter mutations for this variant.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Variant>, sqlx::Error> {
    let row = sqlx::query_as::<_, VariantRow>(&format!("{} FOR UPDATE OF v", VARIANT_SELECT))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Variant::from))
}

/// Load a variant without locking (read-only paths such as price quotes).
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Variant>, sqlx::Error> {
    let row = sqlx::query_as::<_, VariantRow>(VARIANT_SELECT)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Variant::from))
}

/// Write ledger counters back to a row the caller holds locked.
pub async fn apply_counters(
    conn: &mut PgConnection,
    id: Uuid,
    counters: &StockCounters,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE variants SET stock_quantity = $2, reserved_quantity = $3 WHERE id = $1")
        .bind(id)
        .bind(counters.stock_quantity)
        .bind(counters.reserved_quantity)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, status, base_price FROM products ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn list_for_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<Variant>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VariantRow>(
        r#"
        SELECT v.id, v.product_id, v.sku, v.attributes, p.base_price,
               v.stock_quantity, v.reserved_quantity
        FROM variants v
        JOIN products p ON p.id = v.product_id
        WHERE v.product_id = $1
        ORDER BY v.sku
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Variant::from).collect())
}
