use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::catalog::{Category, NewService, Service, ServiceType};
use super::customer::{Address, Customer, CustomerQuery, CustomerSummary, NewAddress, NewCustomer};
use super::errors::DomainError;
use super::order::{
    LineItemView, NewLineItem, NewOrder, Note, OrderPatch, OrderQuery, OrderRecord, OrderSummary,
};
use super::settings::{Discount, NewDiscount, NewOrderStatus, OrderStatus};
use super::totals::OrderTotals;
use super::user::{NewUser, User, UserPatch};
use super::ListResult;

/// Persistence of the order aggregate. Every method is one independent write
/// or read; nothing here groups several field changes into a transaction.
pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrder, status: String) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderRecord>, DomainError>;
    fn list(&self, query: &OrderQuery) -> Result<ListResult<OrderSummary>, DomainError>;
    /// Writes only the fields set in `patch`. Returns `false` if the order is gone.
    fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<bool, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn store_totals(&self, id: Uuid, totals: &OrderTotals) -> Result<(), DomainError>;
    fn replace_notes(&self, id: Uuid, notes: &[Note]) -> Result<bool, DomainError>;

    fn lines(&self, order_id: Uuid) -> Result<Vec<LineItemView>, DomainError>;
    fn find_line(&self, order_id: Uuid, line_id: Uuid)
        -> Result<Option<LineItemView>, DomainError>;
    fn insert_line(&self, order_id: Uuid, line: NewLineItem) -> Result<Uuid, DomainError>;
    fn update_line(
        &self,
        line_id: Uuid,
        quantity: i32,
        subtotal: &BigDecimal,
    ) -> Result<(), DomainError>;
    fn delete_line(&self, line_id: Uuid) -> Result<bool, DomainError>;

    // Lookups into neighbouring tables the order editor depends on.
    fn service_price(&self, service_id: Uuid) -> Result<Option<BigDecimal>, DomainError>;
    fn status_names(&self) -> Result<Vec<String>, DomainError>;
    fn customer_summary(&self, id: Uuid) -> Result<Option<CustomerSummary>, DomainError>;
    fn address(&self, id: Uuid) -> Result<Option<Address>, DomainError>;
}

pub trait CustomerRepository: Send + Sync + 'static {
    fn create(&self, customer: &NewCustomer) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn update(&self, id: Uuid, customer: &NewCustomer) -> Result<bool, DomainError>;
    /// Deletes the customer and, by cascade, their addresses. Returns the ids
    /// of the orders whose references were cleared, or `None` if the
    /// customer did not exist.
    fn delete(&self, id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError>;
    fn list(&self, query: &CustomerQuery) -> Result<ListResult<Customer>, DomainError>;

    fn addresses(&self, customer_id: Uuid) -> Result<Vec<Address>, DomainError>;
    fn find_address(&self, id: Uuid) -> Result<Option<Address>, DomainError>;
    fn create_address(&self, customer_id: Uuid, address: &NewAddress)
        -> Result<Uuid, DomainError>;
    fn update_address(&self, id: Uuid, address: &NewAddress) -> Result<bool, DomainError>;
    /// Same contract as `delete`: the orders that pointed at the address.
    fn delete_address(&self, id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn categories(&self) -> Result<Vec<Category>, DomainError>;
    fn create_category(&self, name: &str) -> Result<Uuid, DomainError>;
    fn rename_category(&self, id: Uuid, name: &str) -> Result<bool, DomainError>;
    fn delete_category(&self, id: Uuid) -> Result<bool, DomainError>;

    fn service_types(&self) -> Result<Vec<ServiceType>, DomainError>;
    fn create_service_type(&self, name: &str) -> Result<Uuid, DomainError>;
    fn delete_service_type(&self, id: Uuid) -> Result<bool, DomainError>;

    fn services(&self, category_id: Option<Uuid>) -> Result<Vec<Service>, DomainError>;
    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError>;
    fn create_service(&self, service: &NewService) -> Result<Uuid, DomainError>;
    fn update_service(&self, id: Uuid, service: &NewService) -> Result<bool, DomainError>;
    fn delete_service(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait SettingsRepository: Send + Sync + 'static {
    fn discounts(&self) -> Result<Vec<Discount>, DomainError>;
    fn find_discount(&self, id: Uuid) -> Result<Option<Discount>, DomainError>;
    fn create_discount(&self, discount: &NewDiscount) -> Result<Uuid, DomainError>;
    fn update_discount(&self, id: Uuid, discount: &NewDiscount) -> Result<bool, DomainError>;
    fn delete_discount(&self, id: Uuid) -> Result<bool, DomainError>;

    /// All statuses sorted by position.
    fn statuses(&self) -> Result<Vec<OrderStatus>, DomainError>;
    /// Appends the status after the current last position.
    fn create_status(&self, status: &NewOrderStatus) -> Result<Uuid, DomainError>;
    fn update_status(&self, id: Uuid, status: &NewOrderStatus) -> Result<bool, DomainError>;
    fn delete_status(&self, id: Uuid) -> Result<bool, DomainError>;
    /// Exchanges the positions of two statuses atomically.
    fn swap_status_positions(&self, a: Uuid, b: Uuid) -> Result<(), DomainError>;
}

pub trait UserRepository: Send + Sync + 'static {
    fn list(&self) -> Result<Vec<User>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn create(&self, user: &NewUser) -> Result<Uuid, DomainError>;
    fn update(&self, id: Uuid, patch: &UserPatch) -> Result<bool, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}
