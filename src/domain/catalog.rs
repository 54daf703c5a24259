use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::totals::MONEY_SCALE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of treatment a service belongs to (washing, ironing, dry cleaning...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceType {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub service_type_id: Option<Option<Uuid>>,
    pub price: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

pub fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid("name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Prices are stored as NUMERIC(10,2): non-negative, below 10^8, in cents.
pub fn validate_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::zero() {
        return Err(DomainError::invalid(format!(
            "price must not be negative, got {price}"
        )));
    }
    if *price >= BigDecimal::from(100_000_000) {
        return Err(DomainError::invalid(format!("price {price} is too large")));
    }
    if price.with_scale(MONEY_SCALE) != *price {
        return Err(DomainError::invalid(format!(
            "price allows at most two decimals, got {price}"
        )));
    }
    Ok(())
}
