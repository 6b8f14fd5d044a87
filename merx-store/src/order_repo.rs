use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// One checkout line, copied verbatim from the reservation snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

pub async fn insert(conn: &mut PgConnection, order: &OrderRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, total_amount, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(&order.status)
    .bind(order.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn insert_line(conn: &mut PgConnection, line: &OrderLineRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_lines (id, order_id, variant_id, quantity,
                                 unit_price, discount, final_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(line.id)
    .bind(line.order_id)
    .bind(line.variant_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.discount)
    .bind(line.final_price)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, total_amount, status, created_at FROM orders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn lines_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderLineRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderLineRow>(
        r#"
        SELECT id, order_id, variant_id, quantity, unit_price, discount, final_price
        FROM order_lines
        WHERE order_id = $1
        ORDER BY variant_id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}
