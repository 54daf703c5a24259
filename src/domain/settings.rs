use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct Discount {
    pub id: Uuid,
    pub name: String,
    pub percentage: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub percentage: BigDecimal,
}

#[derive(Debug, Clone, Default)]
pub struct DiscountPatch {
    pub name: Option<String>,
    pub percentage: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatus {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrderStatus {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderStatusPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Finds the status that `id` swaps places with when moved one step.
///
/// `statuses` must be sorted by position. Returns `None` when `id` is
/// already at the edge it is moving towards.
pub fn swap_partner(
    statuses: &[OrderStatus],
    id: Uuid,
    direction: MoveDirection,
) -> Result<Option<&OrderStatus>, DomainError> {
    let index = statuses
        .iter()
        .position(|s| s.id == id)
        .ok_or(DomainError::NotFound)?;
    let partner = match direction {
        MoveDirection::Up => index.checked_sub(1).and_then(|i| statuses.get(i)),
        MoveDirection::Down => statuses.get(index + 1),
    };
    Ok(partner)
}
