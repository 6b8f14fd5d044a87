use chrono::{DateTime, Utc};
use merx_catalog::{DiscountType, PricingRule, RuleAction, RuleCondition};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::warn;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: Uuid,
    name: String,
    priority: i32,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct ConditionRow {
    rule_id: Uuid,
    product_id: Option<Uuid>,
    variant_id: Option<Uuid>,
    min_quantity: Option<i64>,
    user_tier: Option<String>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    promo_code: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ActionRow {
    rule_id: Uuid,
    discount_type: String,
    discount_value: Decimal,
}

/// Fetch the active rules that could apply to a variant, with their
/// conditions and actions.
///
/// The query only prefilters on the indexed product/variant condition
/// columns so pricing work under a held variant lock stays cheap; the pure
/// engine performs the full condition match. Rules are re-read on every
/// call so operational changes take effect without a restart.
pub async fn candidates_for_variant(
    conn: &mut PgConnection,
    product_id: Uuid,
    variant_id: Uuid,
) -> Result<Vec<PricingRule>, sqlx::Error> {
    let rule_rows = sqlx::query_as::<_, RuleRow>(
        r#"
        SELECT DISTINCT r.id, r.name, r.priority, r.is_active
        FROM pricing_rules r
        JOIN pricing_rule_conditions c ON c.rule_id = r.id
        WHERE r.is_active
          AND (c.product_id IS NULL OR c.product_id = $1)
          AND (c.variant_id IS NULL OR c.variant_id = $2)
        "#,
    )
    .bind(product_id)
    .bind(variant_id)
    .fetch_all(&mut *conn)
    .await?;

    if rule_rows.is_empty() {
        return Ok(Vec::new());
    }

    let rule_ids: Vec<Uuid> = rule_rows.iter().map(|r| r.id).collect();

    let condition_rows = sqlx::query_as::<_, ConditionRow>(
        r#"
        SELECT rule_id, product_id, variant_id, min_quantity, user_tier,
               start_at, end_at, promo_code
        FROM pricing_rule_conditions
        WHERE rule_id = ANY($1)
        "#,
    )
    .bind(&rule_ids)
    .fetch_all(&mut *conn)
    .await?;

    let action_rows = sqlx::query_as::<_, ActionRow>(
        r#"
        SELECT rule_id, discount_type, discount_value
        FROM pricing_rule_actions
        WHERE rule_id = ANY($1)
        "#,
    )
    .bind(&rule_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut rules: Vec<PricingRule> = rule_rows
        .into_iter()
        .map(|row| PricingRule {
            id: row.id,
            name: row.name,
            priority: row.priority,
            is_active: row.is_active,
            conditions: Vec::new(),
            actions: Vec::new(),
        })
        .collect();

    for cond in condition_rows {
        if let Some(rule) = rules.iter_mut().find(|r| r.id == cond.rule_id) {
            rule.conditions.push(RuleCondition {
                product_id: cond.product_id,
                variant_id: cond.variant_id,
                min_quantity: cond.min_quantity,
                user_tier: cond.user_tier,
                start_at: cond.start_at,
                end_at: cond.end_at,
                promo_code: cond.promo_code,
            });
        }
    }

    for action in action_rows {
        let discount_type = match action.discount_type.as_str() {
            "PERCENT" => DiscountType::Percent,
            "ABSOLUTE" => DiscountType::Absolute,
            other => {
                warn!(rule_id = %action.rule_id, discount_type = other, "Unknown discount type, skipping action");
                continue;
            }
        };
        if let Some(rule) = rules.iter_mut().find(|r| r.id == action.rule_id) {
            rule.actions.push(RuleAction {
                discount_type,
                value: action.discount_value,
            });
        }
    }

    Ok(rules)
}
