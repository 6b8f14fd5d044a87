use chrono::{DateTime, Utc};
use merx_core::UserContext;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::Variant;

/// A prioritized discount rule. Lower priority number = applied first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: Uuid,
    pub name: String,
    pub priority: i32,
    pub is_active: bool,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
}

/// One condition of a rule. Every `None` field is a wildcard; a rule matches
/// only when all of its conditions match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleCondition {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub min_quantity: Option<i64>,
    pub user_tier: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percent,
    Absolute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    pub discount_type: DiscountType,
    pub value: Decimal,
}

/// A rule that contributed to a price, with the amount it took off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule_id: Uuid,
    pub name: String,
    pub amount: Decimal,
}

/// Immutable result of one pricing evaluation. Frozen into the reservation
/// snapshot and authoritative through checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub final_unit_price: Decimal,
    pub quantity: i64,
    pub total_before_discount: Decimal,
    pub total_discount: Decimal,
    pub total_after_discount: Decimal,
    pub applied_rules: Vec<AppliedRule>,
}

/// Evaluate the supplied rules against a variant and quantity.
///
/// Pure and side-effect free: the caller fetches the candidate rules (fresh
/// on every call, never cached) and owns all locking and persistence.
/// The only rounding happens at the final unit-price division; per-rule
/// contributions accumulate at full precision to avoid drift.
pub fn calculate_price(
    variant: &Variant,
    quantity: i64,
    user: &UserContext,
    promo_code: Option<&str>,
    now: DateTime<Utc>,
    rules: &[PricingRule],
) -> PriceBreakdown {
    let qty = Decimal::from(quantity);
    let total_before = variant.base_price * qty;

    let mut matching: Vec<&PricingRule> = rules
        .iter()
        .filter(|rule| {
            rule.is_active
                && rule
                    .conditions
                    .iter()
                    .all(|c| condition_matches(c, variant, quantity, user, promo_code, now))
        })
        .collect();
    matching.sort_by_key(|rule| rule.priority);

    let mut total_discount = Decimal::ZERO;
    let mut applied = Vec::new();
    for rule in matching {
        let amount = rule_discount(rule, total_before);
        if amount <= Decimal::ZERO {
            continue;
        }
        total_discount += amount;
        applied.push(AppliedRule {
            rule_id: rule.id,
            name: rule.name.clone(),
            amount,
        });
    }

    if total_discount > total_before {
        total_discount = total_before;
    }
    let total_discount =
        total_discount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total_after = total_before - total_discount;
    let final_unit_price =
        (total_after / qty).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    PriceBreakdown {
        base_price: variant.base_price,
        final_unit_price,
        quantity,
        total_before_discount: total_before,
        total_discount,
        total_after_discount: total_after,
        applied_rules: applied,
    }
}

fn condition_matches(
    condition: &RuleCondition,
    variant: &Variant,
    quantity: i64,
    user: &UserContext,
    promo_code: Option<&str>,
    now: DateTime<Utc>,
) -> bool {
    if let Some(product_id) = condition.product_id {
        if product_id != variant.product_id {
            return false;
        }
    }
    if let Some(variant_id) = condition.variant_id {
        if variant_id != variant.id {
            return false;
        }
    }
    if let Some(min_quantity) = condition.min_quantity {
        if quantity < min_quantity {
            return false;
        }
    }
    if let Some(tier) = &condition.user_tier {
        if user.tier.as_deref() != Some(tier.as_str()) {
            return false;
        }
    }
    if let Some(start_at) = condition.start_at {
        if now < start_at {
            return false;
        }
    }
    if let Some(end_at) = condition.end_at {
        if now > end_at {
            return false;
        }
    }
    // A promo-gated rule requires the caller to have supplied that exact
    // code; no code means no match.
    if let Some(code) = &condition.promo_code {
        if promo_code != Some(code.as_str()) {
            return false;
        }
    }
    true
}

fn rule_discount(rule: &PricingRule, total_before: Decimal) -> Decimal {
    rule.actions
        .iter()
        .map(|action| match action.discount_type {
            DiscountType::Percent => total_before * action.value / Decimal::from(100),
            DiscountType::Absolute => action.value,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn variant(base_price: &str) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            sku: "SKU-TEST".to_string(),
            attributes: None,
            base_price: base_price.parse().unwrap(),
            stock_quantity: 100,
            reserved_quantity: 0,
        }
    }

    fn rule(name: &str, priority: i32, conditions: Vec<RuleCondition>, actions: Vec<RuleAction>) -> PricingRule {
        PricingRule {
            id: Uuid::new_v4(),
            name: name.to_string(),
            priority,
            is_active: true,
            conditions,
            actions,
        }
    }

    fn percent(value: &str) -> RuleAction {
        RuleAction {
            discount_type: DiscountType::Percent,
            value: value.parse().unwrap(),
        }
    }

    fn absolute(value: &str) -> RuleAction {
        RuleAction {
            discount_type: DiscountType::Absolute,
            value: value.parse().unwrap(),
        }
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_no_rules_keeps_base_price() {
        let v = variant("10.00");
        let b = calculate_price(&v, 10, &UserContext::anonymous(), None, Utc::now(), &[]);

        assert_eq!(b.total_before_discount, dec("100.00"));
        assert_eq!(b.total_discount, dec("0.00"));
        assert_eq!(b.total_after_discount, dec("100.00"));
        assert_eq!(b.final_unit_price, dec("10.00"));
        assert!(b.applied_rules.is_empty());
    }

    #[test]
    fn test_bulk_percentage_discount() {
        let v = variant("20.00");
        let rules = vec![rule(
            "10% off 5+",
            10,
            vec![RuleCondition {
                min_quantity: Some(5),
                ..Default::default()
            }],
            vec![percent("10")],
        )];

        let b = calculate_price(&v, 5, &UserContext::anonymous(), None, Utc::now(), &rules);

        assert_eq!(b.total_before_discount, dec("100.00"));
        assert_eq!(b.total_discount, dec("10.00"));
        assert_eq!(b.total_after_discount, dec("90.00"));
        assert_eq!(b.final_unit_price, dec("18.00"));
        assert_eq!(b.applied_rules.len(), 1);
    }

    #[test]
    fn test_stacked_rules_apply_in_priority_order() {
        let v = variant("20.00");
        let rules = vec![
            rule("flat five", 20, vec![RuleCondition::default()], vec![absolute("5.00")]),
            rule("ten percent", 10, vec![RuleCondition::default()], vec![percent("10")]),
        ];

        let b = calculate_price(&v, 5, &UserContext::anonymous(), None, Utc::now(), &rules);

        assert_eq!(b.total_discount, dec("15.00"));
        assert_eq!(b.total_after_discount, dec("85.00"));
        assert_eq!(b.final_unit_price, dec("17.00"));
        // priority 10 first, priority 20 second
        assert_eq!(b.applied_rules[0].name, "ten percent");
        assert_eq!(b.applied_rules[0].amount, dec("10.00"));
        assert_eq!(b.applied_rules[1].name, "flat five");
        assert_eq!(b.applied_rules[1].amount, dec("5.00"));
    }

    #[test]
    fn test_discount_clamped_to_total() {
        let v = variant("10.00");
        let rules = vec![rule(
            "too generous",
            10,
            vec![RuleCondition::default()],
            vec![absolute("500.00")],
        )];

        let b = calculate_price(&v, 2, &UserContext::anonymous(), None, Utc::now(), &rules);

        assert_eq!(b.total_discount, dec("20.00"));
        assert_eq!(b.total_after_discount, dec("0.00"));
        assert_eq!(b.final_unit_price, dec("0.00"));
    }

    #[test]
    fn test_inactive_rule_ignored() {
        let v = variant("10.00");
        let mut r = rule("dormant", 10, vec![RuleCondition::default()], vec![percent("50")]);
        r.is_active = false;

        let b = calculate_price(&v, 1, &UserContext::anonymous(), None, Utc::now(), &[r]);
        assert_eq!(b.total_discount, dec("0.00"));
    }

    #[test]
    fn test_min_quantity_boundary() {
        let v = variant("10.00");
        let rules = vec![rule(
            "bulk",
            10,
            vec![RuleCondition {
                min_quantity: Some(5),
                ..Default::default()
            }],
            vec![percent("10")],
        )];

        let below = calculate_price(&v, 4, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert!(below.applied_rules.is_empty());

        let at = calculate_price(&v, 5, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert_eq!(at.applied_rules.len(), 1);
    }

    #[test]
    fn test_user_tier_condition() {
        let v = variant("10.00");
        let rules = vec![rule(
            "gold perk",
            10,
            vec![RuleCondition {
                user_tier: Some("gold".to_string()),
                ..Default::default()
            }],
            vec![percent("10")],
        )];

        let anon = calculate_price(&v, 1, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert!(anon.applied_rules.is_empty());

        let gold = calculate_price(&v, 1, &UserContext::with_tier("gold"), None, Utc::now(), &rules);
        assert_eq!(gold.total_discount, dec("1.00"));
    }

    #[test]
    fn test_time_window_brackets_now() {
        let v = variant("10.00");
        let now = Utc::now();
        let live = rule(
            "sale",
            10,
            vec![RuleCondition {
                start_at: Some(now - Duration::hours(1)),
                end_at: Some(now + Duration::hours(1)),
                ..Default::default()
            }],
            vec![percent("10")],
        );
        let over = rule(
            "ended sale",
            20,
            vec![RuleCondition {
                end_at: Some(now - Duration::hours(1)),
                ..Default::default()
            }],
            vec![percent("10")],
        );

        let b = calculate_price(&v, 1, &UserContext::anonymous(), None, now, &[live, over]);
        assert_eq!(b.applied_rules.len(), 1);
        assert_eq!(b.applied_rules[0].name, "sale");
    }

    #[test]
    fn test_promo_rule_requires_supplied_code() {
        let v = variant("10.00");
        let rules = vec![rule(
            "promo",
            10,
            vec![RuleCondition {
                promo_code: Some("SAVE10".to_string()),
                ..Default::default()
            }],
            vec![percent("10")],
        )];

        let none = calculate_price(&v, 1, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert!(none.applied_rules.is_empty());

        let wrong = calculate_price(&v, 1, &UserContext::anonymous(), Some("OTHER"), Utc::now(), &rules);
        assert!(wrong.applied_rules.is_empty());

        let right = calculate_price(&v, 1, &UserContext::anonymous(), Some("SAVE10"), Utc::now(), &rules);
        assert_eq!(right.total_discount, dec("1.00"));
    }

    #[test]
    fn test_zero_contribution_rule_omitted() {
        let v = variant("10.00");
        let rules = vec![rule(
            "noop",
            10,
            vec![RuleCondition::default()],
            vec![percent("0")],
        )];

        let b = calculate_price(&v, 1, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert!(b.applied_rules.is_empty());
        assert_eq!(b.total_discount, dec("0.00"));
    }

    #[test]
    fn test_rounding_only_at_final_division() {
        let v = variant("10.00");
        // 33.33 / 3 does not divide evenly; the unit price rounds once
        let rules = vec![rule(
            "odd discount",
            10,
            vec![RuleCondition::default()],
            vec![absolute("3.33")],
        )];

        let b = calculate_price(&v, 3, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert_eq!(b.total_before_discount, dec("30.00"));
        assert_eq!(b.total_discount, dec("3.33"));
        assert_eq!(b.total_after_discount, dec("26.67"));
        // 26.67 / 3 = 8.89
        assert_eq!(b.final_unit_price, dec("8.89"));
    }

    #[test]
    fn test_variant_scoped_rule_only_hits_its_variant() {
        let v = variant("10.00");
        let other = variant("10.00");
        let rules = vec![rule(
            "variant deal",
            10,
            vec![RuleCondition {
                variant_id: Some(v.id),
                ..Default::default()
            }],
            vec![percent("10")],
        )];

        let hit = calculate_price(&v, 1, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert_eq!(hit.applied_rules.len(), 1);

        let miss = calculate_price(&other, 1, &UserContext::anonymous(), None, Utc::now(), &rules);
        assert!(miss.applied_rules.is_empty());
    }
}
