use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::search;
use super::Pagination;

#[derive(Debug, Clone)]
pub struct Customer {
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

impl Customer {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name)
    }
}

pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub marketing_email: bool,
    pub marketing_sms: bool,
}

impl NewCustomer {
    pub fn search_key(&self) -> String {
        search::search_key([
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.email.as_deref(),
            self.phone.as_deref(),
        ])
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub marketing_email: Option<bool>,
    pub marketing_sms: Option<bool>,
}

impl CustomerPatch {
    /// Applies the patch to `current`, returning the resulting values.
    pub fn apply_to(&self, current: &Customer) -> NewCustomer {
        NewCustomer {
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| current.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| current.last_name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            phone: self.phone.clone().unwrap_or_else(|| current.phone.clone()),
            marketing_email: self.marketing_email.unwrap_or(current.marketing_email),
            marketing_sms: self.marketing_sms.unwrap_or(current.marketing_sms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    pub pagination: Pagination,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub address: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressPatch {
    pub address: Option<String>,
    pub details: Option<Option<String>>,
}
