use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Persisted form of one active stock hold, unique per (cart, variant).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: i64,
    pub reserved_until: DateTime<Utc>,
    pub unit_price_snapshot: Decimal,
    pub discount_snapshot: Decimal,
    pub final_price_snapshot: Decimal,
}

/// Candidate surfaced by the expiry scan; re-validated under the variant
/// lock before anything is mutated.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ExpiredCandidate {
    pub id: Uuid,
    pub variant_id: Uuid,
}

const RESERVATION_COLUMNS: &str = "id, cart_id, variant_id, quantity, reserved_until, \
     unit_price_snapshot, discount_snapshot, final_price_snapshot";

pub async fn find(
    conn: &mut PgConnection,
    cart_id: Uuid,
    variant_id: Uuid,
) -> Result<Option<ReservationRow>, sqlx::Error> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE cart_id = $1 AND variant_id = $2"
    ))
    .bind(cart_id)
    .bind(variant_id)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ReservationRow>, sqlx::Error> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Create the hold, or overwrite quantity, deadline and snapshot in place
/// for an existing (cart, variant) pair. Last write wins.
pub async fn upsert(conn: &mut PgConnection, row: &ReservationRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, cart_id, variant_id, quantity, reserved_until,
                                  unit_price_snapshot, discount_snapshot, final_price_snapshot)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (cart_id, variant_id) DO UPDATE SET
            quantity = EXCLUDED.quantity,
            reserved_until = EXCLUDED.reserved_until,
            unit_price_snapshot = EXCLUDED.unit_price_snapshot,
            discount_snapshot = EXCLUDED.discount_snapshot,
            final_price_snapshot = EXCLUDED.final_price_snapshot
        "#,
    )
    .bind(row.id)
    .bind(row.cart_id)
    .bind(row.variant_id)
    .bind(row.quantity)
    .bind(row.reserved_until)
    .bind(row.unit_price_snapshot)
    .bind(row.discount_snapshot)
    .bind(row.final_price_snapshot)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn list_for_cart(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<ReservationRow>, sqlx::Error> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE cart_id = $1 ORDER BY variant_id"
    ))
    .bind(cart_id)
    .fetch_all(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM reservations WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Unlocked scan for holds past their deadline. Uses the reserved_until
/// index; results are only hints until re-checked under the variant lock.
pub async fn expired_candidates(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<ExpiredCandidate>, sqlx::Error> {
    sqlx::query_as::<_, ExpiredCandidate>(
        "SELECT id, variant_id FROM reservations WHERE reserved_until < $1",
    )
    .bind(now)
    .fetch_all(pool)
    .await
}
