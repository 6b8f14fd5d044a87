//! Development seed: stands in for the catalog collaborator by creating a
//! couple of products, their variants and a few pricing rules.

use merx_store::app_config::Config;
use merx_store::DbClient;
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let db = DbClient::new(&config.database).await?;
    db.migrate().await?;

    let pool = &db.pool;

    let tee = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, description, status, base_price) VALUES ($1, $2, $3, $4, $5)")
        .bind(tee)
        .bind("Classic Tee")
        .bind("Plain cotton tee")
        .bind("ACTIVE")
        .bind(Decimal::new(2000, 2)) // 20.00
        .execute(pool)
        .await?;

    let mug = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, description, status, base_price) VALUES ($1, $2, $3, $4, $5)")
        .bind(mug)
        .bind("Enamel Mug")
        .bind(None::<String>)
        .bind("ACTIVE")
        .bind(Decimal::new(1000, 2)) // 10.00
        .execute(pool)
        .await?;

    for (product_id, sku, stock) in [
        (tee, "TEE-S", 100_i64),
        (tee, "TEE-M", 250),
        (tee, "TEE-L", 80),
        (mug, "MUG-STD", 500),
    ] {
        sqlx::query(
            "INSERT INTO variants (id, product_id, sku, stock_quantity, reserved_quantity) VALUES ($1, $2, $3, $4, 0)",
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(sku)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    // Bulk rule: 10% off five or more tees
    let bulk = Uuid::new_v4();
    sqlx::query("INSERT INTO pricing_rules (id, name, is_active, priority) VALUES ($1, $2, TRUE, 10)")
        .bind(bulk)
        .bind("Bulk tees 10% off")
        .execute(pool)
        .await?;
    sqlx::query(
        "INSERT INTO pricing_rule_conditions (id, rule_id, product_id, min_quantity) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(bulk)
    .bind(tee)
    .bind(5_i64)
    .execute(pool)
    .await?;
    sqlx::query(
        "INSERT INTO pricing_rule_actions (id, rule_id, discount_type, discount_value) VALUES ($1, $2, 'PERCENT', $3)",
    )
    .bind(Uuid::new_v4())
    .bind(bulk)
    .bind(Decimal::from(10))
    .execute(pool)
    .await?;

    // Promo rule: flat 5.00 off with code WELCOME5
    let promo = Uuid::new_v4();
    sqlx::query("INSERT INTO pricing_rules (id, name, is_active, priority) VALUES ($1, $2, TRUE, 20)")
        .bind(promo)
        .bind("Welcome promo")
        .execute(pool)
        .await?;
    sqlx::query(
        "INSERT INTO pricing_rule_conditions (id, rule_id, promo_code) VALUES ($1, $2, 'WELCOME5')",
    )
    .bind(Uuid::new_v4())
    .bind(promo)
    .execute(pool)
    .await?;
    sqlx::query(
        "INSERT INTO pricing_rule_actions (id, rule_id, discount_type, discount_value) VALUES ($1, $2, 'ABSOLUTE', $3)",
    )
    .bind(Uuid::new_v4())
    .bind(promo)
    .bind(Decimal::new(500, 2)) // 5.00
    .execute(pool)
    .await?;

    println!("Seeded 2 products, 4 variants, 2 pricing rules");
    Ok(())
}
