use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::autosave::PatchSink;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    append_note, remove_note, LineItemView, NewLineItem, NewOrder, Note, OrderPatch, OrderQuery,
    OrderRecord, OrderSummary, OrderView,
};
use crate::domain::ports::OrderRepository;
use crate::domain::totals::{
    compute_totals, line_subtotal, validate_discount_percent, validate_quantity, LineAmount,
    OrderTotals,
};
use crate::domain::ListResult;
use crate::realtime::{Action, ChangeEvent, ChangeFeed};

/// Reads and writes the order aggregate. Each call is one independent write
/// followed by a change notification; totals are recomputed and persisted
/// whenever a line or the discount changes.
pub struct OrderService<R> {
    repo: R,
    feed: ChangeFeed,
}

fn amounts(lines: &[LineItemView]) -> Vec<LineAmount> {
    lines
        .iter()
        .map(|l| LineAmount {
            quantity: l.quantity,
            unit_price: l.unit_price.clone(),
        })
        .collect()
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn create_order(&self, order: NewOrder) -> Result<Uuid, DomainError> {
        validate_discount_percent(&order.discount_percent)?;
        let status = self.resolve_status(order.status.as_deref())?;
        if let Some(customer_id) = order.customer_id {
            self.require_customer(customer_id)?;
        }

        let id = self.repo.create(order, status)?;
        log::info!("created order {id}");
        self.feed.publish(ChangeEvent::order(Action::Insert, id));
        Ok(id)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let Some(order) = self.repo.find_by_id(id)? else {
            return Ok(None);
        };

        let lines = self.repo.lines(id)?;
        let totals = compute_totals(&amounts(&lines), &order.discount_percent)?;
        let customer = match order.customer_id {
            Some(c) => self.repo.customer_summary(c)?,
            None => None,
        };
        let pickup_address = match order.pickup_address_id {
            Some(a) => self.repo.address(a)?,
            None => None,
        };
        let delivery_address = match order.delivery_address_id {
            Some(a) => self.repo.address(a)?,
            None => None,
        };

        Ok(Some(OrderView {
            order,
            customer,
            pickup_address,
            delivery_address,
            lines,
            totals,
        }))
    }

    pub fn list_orders(&self, query: &OrderQuery) -> Result<ListResult<OrderSummary>, DomainError> {
        self.repo.list(query)
    }

    /// Applies a partial update to the order row.
    ///
    /// Switching to a different customer without naming new addresses clears
    /// the pickup and delivery addresses, which belonged to the old customer.
    pub fn update_order(&self, id: Uuid, patch: OrderPatch) -> Result<(), DomainError> {
        if patch.is_empty() {
            return Err(DomainError::invalid("nothing to update"));
        }
        let current = self.require_order(id)?;
        let mut patch = patch;

        if let Some(status) = patch.status.as_deref() {
            self.resolve_status(Some(status))?;
        }
        if let Some(percent) = &patch.discount_percent {
            validate_discount_percent(percent)?;
        }

        let customer_id = match patch.customer_id {
            Some(new_customer) => {
                if let Some(c) = new_customer {
                    self.require_customer(c)?;
                }
                if new_customer != current.customer_id {
                    patch.pickup_address_id.get_or_insert(None);
                    patch.delivery_address_id.get_or_insert(None);
                }
                new_customer
            }
            None => current.customer_id,
        };
        for address_id in [patch.pickup_address_id, patch.delivery_address_id]
            .into_iter()
            .flatten()
            .flatten()
        {
            self.require_address_of(address_id, customer_id)?;
        }

        if !self.repo.update(id, &patch)? {
            return Err(DomainError::NotFound);
        }
        if patch.discount_percent.is_some() {
            let stored = self.require_order(id)?;
            self.recalculate(id, &stored.discount_percent)?;
        }

        log::info!("updated order {id}");
        self.feed.publish(ChangeEvent::order(Action::Update, id));
        Ok(())
    }

    pub fn delete_order(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound);
        }
        log::info!("deleted order {id}");
        self.feed.publish(ChangeEvent::order(Action::Delete, id));
        Ok(())
    }

    /// Adds a line priced at the service's current price.
    pub fn add_line(
        &self,
        order_id: Uuid,
        service_id: Uuid,
        quantity: i32,
    ) -> Result<Uuid, DomainError> {
        validate_quantity(quantity)?;
        let order = self.require_order(order_id)?;
        let unit_price = self
            .repo
            .service_price(service_id)?
            .ok_or_else(|| DomainError::invalid(format!("unknown service {service_id}")))?;

        let mut prospective = amounts(&self.repo.lines(order_id)?);
        prospective.push(LineAmount {
            quantity,
            unit_price: unit_price.clone(),
        });
        compute_totals(&prospective, &order.discount_percent)?;

        let line_id = self.repo.insert_line(
            order_id,
            NewLineItem {
                service_id,
                quantity,
                subtotal: line_subtotal(quantity, &unit_price),
                unit_price,
            },
        )?;
        self.recalculate(order_id, &order.discount_percent)?;

        self.feed
            .publish(ChangeEvent::line_item(Action::Insert, line_id, order_id));
        self.feed.publish(ChangeEvent::order(Action::Update, order_id));
        Ok(line_id)
    }

    pub fn update_line_quantity(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<(), DomainError> {
        validate_quantity(quantity)?;
        let order = self.require_order(order_id)?;
        let line = self
            .repo
            .find_line(order_id, line_id)?
            .ok_or(DomainError::NotFound)?;

        let others: Vec<LineItemView> = self
            .repo
            .lines(order_id)?
            .into_iter()
            .filter(|l| l.id != line_id)
            .collect();
        let mut prospective = amounts(&others);
        prospective.push(LineAmount {
            quantity,
            unit_price: line.unit_price.clone(),
        });
        compute_totals(&prospective, &order.discount_percent)?;

        let subtotal = line_subtotal(quantity, &line.unit_price);
        self.repo.update_line(line_id, quantity, &subtotal)?;
        self.recalculate(order_id, &order.discount_percent)?;

        self.feed
            .publish(ChangeEvent::line_item(Action::Update, line_id, order_id));
        self.feed.publish(ChangeEvent::order(Action::Update, order_id));
        Ok(())
    }

    pub fn remove_line(&self, order_id: Uuid, line_id: Uuid) -> Result<(), DomainError> {
        let order = self.require_order(order_id)?;
        if self.repo.find_line(order_id, line_id)?.is_none() || !self.repo.delete_line(line_id)? {
            return Err(DomainError::NotFound);
        }
        self.recalculate(order_id, &order.discount_percent)?;

        self.feed
            .publish(ChangeEvent::line_item(Action::Delete, line_id, order_id));
        self.feed.publish(ChangeEvent::order(Action::Update, order_id));
        Ok(())
    }

    pub fn add_note(&self, order_id: Uuid, title: &str, note: &str) -> Result<Vec<Note>, DomainError> {
        let order = self.require_order(order_id)?;
        let notes = append_note(order.notes, title, note, Utc::now())?;
        self.store_notes(order_id, notes)
    }

    pub fn remove_note(&self, order_id: Uuid, index: usize) -> Result<Vec<Note>, DomainError> {
        let order = self.require_order(order_id)?;
        let notes = remove_note(order.notes, index)?;
        self.store_notes(order_id, notes)
    }

    /// Totals from the current lines and discount, without writing anything.
    pub fn order_totals(&self, id: Uuid) -> Result<OrderTotals, DomainError> {
        let order = self.require_order(id)?;
        let lines = self.repo.lines(id)?;
        compute_totals(&amounts(&lines), &order.discount_percent)
    }

    fn store_notes(&self, order_id: Uuid, notes: Vec<Note>) -> Result<Vec<Note>, DomainError> {
        if !self.repo.replace_notes(order_id, &notes)? {
            return Err(DomainError::NotFound);
        }
        self.feed.publish(ChangeEvent::order(Action::Update, order_id));
        Ok(notes)
    }

    fn recalculate(&self, order_id: Uuid, discount: &BigDecimal) -> Result<OrderTotals, DomainError> {
        let lines = self.repo.lines(order_id)?;
        let totals = compute_totals(&amounts(&lines), discount)?;
        self.repo.store_totals(order_id, &totals)?;
        Ok(totals)
    }

    fn require_order(&self, id: Uuid) -> Result<OrderRecord, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    fn require_customer(&self, id: Uuid) -> Result<(), DomainError> {
        match self.repo.customer_summary(id)? {
            Some(_) => Ok(()),
            None => Err(DomainError::invalid(format!("unknown customer {id}"))),
        }
    }

    fn require_address_of(
        &self,
        address_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        let address = self
            .repo
            .address(address_id)?
            .ok_or_else(|| DomainError::invalid(format!("unknown address {address_id}")))?;
        if Some(address.customer_id) != customer_id {
            return Err(DomainError::invalid(format!(
                "address {address_id} does not belong to the order's customer"
            )));
        }
        Ok(())
    }

    /// Returns the status to store: `requested` if configured, otherwise the
    /// first configured status.
    fn resolve_status(&self, requested: Option<&str>) -> Result<String, DomainError> {
        let names = self.repo.status_names()?;
        match requested {
            Some(name) if names.iter().any(|n| n == name) => Ok(name.to_string()),
            Some(name) => Err(DomainError::invalid(format!("unknown order status '{name}'"))),
            None => names
                .into_iter()
                .next()
                .ok_or_else(|| DomainError::invalid("no order statuses configured")),
        }
    }
}

impl<R: OrderRepository> PatchSink for OrderService<R> {
    fn apply_patch(&self, order_id: Uuid, patch: OrderPatch) -> Result<(), DomainError> {
        self.update_order(order_id, patch)
    }
}
