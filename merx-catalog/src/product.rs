use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::StockCounters;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Archived,
}

impl ProductStatus {
    pub fn from_db(value: &str) -> Self {
        match value {
            "ARCHIVED" => ProductStatus::Archived,
            _ => ProductStatus::Active,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Archived => "ARCHIVED",
        }
    }
}

/// Catalog product owning one or more sellable variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub base_price: Decimal,
}

/// A sellable SKU with tracked stock and reservation counters.
///
/// `base_price` is denormalized from the owning product when the row is
/// loaded; the counters are authoritative only while the row is held under
/// an exclusive lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub attributes: Option<serde_json::Value>,
    pub base_price: Decimal,
    pub stock_quantity: i64,
    pub reserved_quantity: i64,
}

impl Variant {
    pub fn counters(&self) -> StockCounters {
        StockCounters {
            stock_quantity: self.stock_quantity,
            reserved_quantity: self.reserved_quantity,
        }
    }

    pub fn available(&self) -> i64 {
        self.stock_quantity - self.reserved_quantity
    }
}
