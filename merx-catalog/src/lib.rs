pub mod ledger;
pub mod pricing;
pub mod product;

pub use ledger::StockCounters;
pub use pricing::{
    calculate_price, AppliedRule, DiscountType, PriceBreakdown, PricingRule, RuleAction,
    RuleCondition,
};
pub use product::{Product, ProductStatus, Variant};
