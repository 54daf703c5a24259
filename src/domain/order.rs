use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::customer::{Address, CustomerSummary};
use super::errors::DomainError;
use super::totals::OrderTotals;
use super::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "other" => Ok(PaymentMethod::Other),
            other => Err(DomainError::invalid(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Free-text note attached to an order, stored in the order's JSONB column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

pub fn append_note(
    mut notes: Vec<Note>,
    title: &str,
    note: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Note>, DomainError> {
    if title.trim().is_empty() && note.trim().is_empty() {
        return Err(DomainError::invalid("note must have a title or a body"));
    }
    notes.push(Note {
        title: title.trim().to_string(),
        note: note.trim().to_string(),
        timestamp: now,
    });
    Ok(notes)
}

pub fn remove_note(mut notes: Vec<Note>, index: usize) -> Result<Vec<Note>, DomainError> {
    if index >= notes.len() {
        return Err(DomainError::NotFound);
    }
    notes.remove(index);
    Ok(notes)
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub status: Option<String>,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub discount_percent: BigDecimal,
}

/// Partial update of the order row. Outer `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub urgent: Option<bool>,
    pub customer_id: Option<Option<Uuid>>,
    pub pickup_address_id: Option<Option<Uuid>>,
    pub delivery_address_id: Option<Option<Uuid>>,
    pub payment_method: Option<Option<PaymentMethod>>,
    pub discount_percent: Option<BigDecimal>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        *self == OrderPatch::default()
    }

    /// Folds a later patch into this one; fields set in `newer` win.
    pub fn merge(&mut self, newer: OrderPatch) {
        if newer.status.is_some() {
            self.status = newer.status;
        }
        if newer.urgent.is_some() {
            self.urgent = newer.urgent;
        }
        if newer.customer_id.is_some() {
            self.customer_id = newer.customer_id;
        }
        if newer.pickup_address_id.is_some() {
            self.pickup_address_id = newer.pickup_address_id;
        }
        if newer.delivery_address_id.is_some() {
            self.delivery_address_id = newer.delivery_address_id;
        }
        if newer.payment_method.is_some() {
            self.payment_method = newer.payment_method;
        }
        if newer.discount_percent.is_some() {
            self.discount_percent = newer.discount_percent;
        }
    }
}

/// The order row as stored.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub pickup_address_id: Option<Uuid>,
    pub delivery_address_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub discount_percent: BigDecimal,
    pub subtotal: BigDecimal,
    pub total: BigDecimal,
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct LineItemView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

/// The full order aggregate shown by the editor.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: OrderRecord,
    pub customer: Option<CustomerSummary>,
    pub pickup_address: Option<Address>,
    pub delivery_address: Option<Address>,
    pub lines: Vec<LineItemView>,
    pub totals: OrderTotals,
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub pagination: Pagination,
    pub status: Option<String>,
    pub urgent: Option<bool>,
    pub search: Option<String>,
}
