use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity as seen by the pricing and reservation flows.
///
/// The service boundary resolves authentication; by the time a request
/// reaches the engine only the bits that influence pricing remain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<Uuid>,
    /// Loyalty tier matched against pricing-rule `user_tier` conditions.
    pub tier: Option<String>,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_tier(tier: impl Into<String>) -> Self {
        Self {
            user_id: None,
            tier: Some(tier.into()),
        }
    }
}
