use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::catalog::{Category, Service, ServiceType};
use crate::domain::customer::{Address, Customer};
use crate::domain::errors::DomainError;
use crate::domain::order::{Note, OrderRecord, PaymentMethod};
use crate::domain::settings::{Discount, OrderStatus};
use crate::domain::user::{Role, User};
use crate::schema::{
    addresses, categories, customers, discounts, order_line_items, order_statuses, orders,
    service_types, services, users,
};

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub pickup_address_id: Option<Uuid>,
    pub delivery_address_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub discount_percent: BigDecimal,
    pub subtotal: BigDecimal,
    pub total: BigDecimal,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let notes: Vec<Note> = serde_json::from_value(row.notes)?;
        let payment_method = row
            .payment_method
            .as_deref()
            .map(str::parse::<PaymentMethod>)
            .transpose()?;
        Ok(OrderRecord {
            id: row.id,
            status: row.status,
            urgent: row.urgent,
            customer_id: row.customer_id,
            pickup_address_id: row.pickup_address_id,
            delivery_address_id: row.delivery_address_id,
            payment_method,
            discount_percent: row.discount_percent,
            subtotal: row.subtotal,
            total: row.total,
            notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub status: String,
    pub urgent: bool,
    pub customer_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub discount_percent: BigDecimal,
    pub notes: Value,
}

/// Column-wise changes to one order. `None` fields are left out of the
/// `UPDATE`; `updated_at` is always written so the changeset is never empty.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderChangeset {
    pub status: Option<String>,
    pub urgent: Option<bool>,
    pub customer_id: Option<Option<Uuid>>,
    pub pickup_address_id: Option<Option<Uuid>>,
    pub delivery_address_id: Option<Option<Uuid>>,
    pub payment_method: Option<Option<String>>,
    pub discount_percent: Option<BigDecimal>,
    pub subtotal: Option<BigDecimal>,
    pub total: Option<BigDecimal>,
    pub notes: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl OrderChangeset {
    pub fn touch() -> Self {
        Self {
            status: None,
            urgent: None,
            customer_id: None,
            pickup_address_id: None,
            delivery_address_id: None,
            payment_method: None,
            discount_percent: None,
            subtotal: None,
            total: None,
            notes: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_line_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LineItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_line_items)]
pub struct NewLineItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

// ── Customers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub marketing_email: bool,
    pub marketing_sms: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            marketing_email: row.marketing_email,
            marketing_sms: row.marketing_sms,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub struct CustomerValues {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub marketing_email: bool,
    pub marketing_sms: bool,
    pub search_text: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            customer_id: row.customer_id,
            address: row.address,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub details: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = addresses)]
#[diesel(treat_none_as_null = true)]
pub struct AddressChangeset {
    pub address: String,
    pub details: Option<String>,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = service_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceTypeRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<ServiceTypeRow> for ServiceType {
    fn from(row: ServiceTypeRow) -> Self {
        ServiceType {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceRow {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            service_type_id: row.service_type_id,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = services)]
#[diesel(treat_none_as_null = true)]
pub struct ServiceValues {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub price: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

// ── Settings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = discounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DiscountRow {
    pub id: Uuid,
    pub name: String,
    pub percentage: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Discount {
            id: row.id,
            name: row.name,
            percentage: row.percentage,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderStatusRow {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OrderStatusRow> for OrderStatus {
    fn from(row: OrderStatusRow) -> Self {
        OrderStatus {
            id: row.id,
            name: row.name,
            color: row.color,
            position: row.position,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: row.role.parse::<Role>()?,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}
