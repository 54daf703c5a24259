use uuid::Uuid;

use super::non_blank;
use crate::domain::customer::{
    Address, AddressPatch, Customer, CustomerPatch, CustomerQuery, NewAddress, NewCustomer,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CustomerRepository;
use crate::domain::ListResult;
use crate::realtime::{Action, ChangeEvent, ChangeFeed};

pub struct CustomerService<R> {
    repo: R,
    feed: ChangeFeed,
}

fn clean(customer: NewCustomer) -> Result<NewCustomer, DomainError> {
    let customer = NewCustomer {
        first_name: customer.first_name.trim().to_string(),
        last_name: customer.last_name.trim().to_string(),
        email: non_blank(customer.email).map(|e| e.to_lowercase()),
        phone: non_blank(customer.phone),
        ..customer
    };
    if customer.first_name.is_empty() && customer.last_name.is_empty() {
        return Err(DomainError::invalid("customer needs a first or last name"));
    }
    Ok(customer)
}

fn clean_address(address: NewAddress) -> Result<NewAddress, DomainError> {
    let text = address.address.trim();
    if text.is_empty() {
        return Err(DomainError::invalid("address must not be empty"));
    }
    Ok(NewAddress {
        address: text.to_string(),
        details: non_blank(address.details),
    })
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn create_customer(&self, customer: NewCustomer) -> Result<Uuid, DomainError> {
        let customer = clean(customer)?;
        let id = self.repo.create(&customer)?;
        log::info!("created customer {id}");
        self.feed.publish(ChangeEvent::customer(Action::Insert, id));
        Ok(id)
    }

    pub fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn update_customer(&self, id: Uuid, patch: CustomerPatch) -> Result<Customer, DomainError> {
        let current = self.require(id)?;
        let values = clean(patch.apply_to(&current))?;
        if !self.repo.update(id, &values)? {
            return Err(DomainError::NotFound);
        }
        log::info!("updated customer {id}");
        self.feed.publish(ChangeEvent::customer(Action::Update, id));
        self.require(id)
    }

    /// Deletes the customer with their addresses. Orders keep their rows with
    /// the customer reference cleared, and each of them is announced as updated.
    pub fn delete_customer(&self, id: Uuid) -> Result<(), DomainError> {
        let detached = self.repo.delete(id)?.ok_or(DomainError::NotFound)?;
        log::info!("deleted customer {id}, detached {} orders", detached.len());
        self.feed.publish(ChangeEvent::customer(Action::Delete, id));
        self.announce_orders(&detached);
        Ok(())
    }

    pub fn list_customers(&self, query: &CustomerQuery) -> Result<ListResult<Customer>, DomainError> {
        self.repo.list(query)
    }

    pub fn addresses(&self, customer_id: Uuid) -> Result<Vec<Address>, DomainError> {
        self.require(customer_id)?;
        self.repo.addresses(customer_id)
    }

    pub fn create_address(
        &self,
        customer_id: Uuid,
        address: NewAddress,
    ) -> Result<Uuid, DomainError> {
        self.require(customer_id)?;
        let address = clean_address(address)?;
        let id = self.repo.create_address(customer_id, &address)?;
        self.feed
            .publish(ChangeEvent::address(Action::Insert, id, customer_id));
        Ok(id)
    }

    pub fn update_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
        patch: AddressPatch,
    ) -> Result<Address, DomainError> {
        let current = self.require_address(customer_id, address_id)?;
        let values = clean_address(NewAddress {
            address: patch.address.unwrap_or(current.address),
            details: patch.details.unwrap_or(current.details),
        })?;
        if !self.repo.update_address(address_id, &values)? {
            return Err(DomainError::NotFound);
        }
        self.feed
            .publish(ChangeEvent::address(Action::Update, address_id, customer_id));
        self.require_address(customer_id, address_id)
    }

    pub fn delete_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<(), DomainError> {
        self.require_address(customer_id, address_id)?;
        let detached = self
            .repo
            .delete_address(address_id)?
            .ok_or(DomainError::NotFound)?;
        self.feed
            .publish(ChangeEvent::address(Action::Delete, address_id, customer_id));
        self.announce_orders(&detached);
        Ok(())
    }

    fn announce_orders(&self, order_ids: &[Uuid]) {
        for &order_id in order_ids {
            self.feed.publish(ChangeEvent::order(Action::Update, order_id));
        }
    }

    fn require(&self, id: Uuid) -> Result<Customer, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    fn require_address(&self, customer_id: Uuid, address_id: Uuid) -> Result<Address, DomainError> {
        self.repo
            .find_address(address_id)?
            .filter(|a| a.customer_id == customer_id)
            .ok_or(DomainError::NotFound)
    }
}
