use uuid::Uuid;

use super::non_blank;
use crate::domain::catalog::validate_name;
use crate::domain::errors::DomainError;
use crate::domain::ports::SettingsRepository;
use crate::domain::settings::{
    swap_partner, Discount, DiscountPatch, MoveDirection, NewDiscount, NewOrderStatus, OrderStatus,
    OrderStatusPatch,
};
use crate::domain::totals::validate_discount_percent;
use crate::realtime::{Action, ChangeEvent, ChangeFeed, Table};

/// Discount presets and the configurable order status list.
pub struct SettingsService<R> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: SettingsRepository> SettingsService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn discounts(&self) -> Result<Vec<Discount>, DomainError> {
        self.repo.discounts()
    }

    pub fn create_discount(&self, discount: NewDiscount) -> Result<Uuid, DomainError> {
        let discount = Self::validated_discount(discount)?;
        let id = self.repo.create_discount(&discount)?;
        self.notify(Table::Discounts, Action::Insert, id);
        Ok(id)
    }

    pub fn update_discount(&self, id: Uuid, patch: DiscountPatch) -> Result<Discount, DomainError> {
        let current = self.repo.find_discount(id)?.ok_or(DomainError::NotFound)?;
        let discount = Self::validated_discount(NewDiscount {
            name: patch.name.unwrap_or(current.name),
            percentage: patch.percentage.unwrap_or(current.percentage),
        })?;
        if !self.repo.update_discount(id, &discount)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Discounts, Action::Update, id);
        self.repo.find_discount(id)?.ok_or(DomainError::NotFound)
    }

    pub fn delete_discount(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_discount(id)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Discounts, Action::Delete, id);
        Ok(())
    }

    pub fn statuses(&self) -> Result<Vec<OrderStatus>, DomainError> {
        self.repo.statuses()
    }

    pub fn create_status(&self, status: NewOrderStatus) -> Result<Uuid, DomainError> {
        let status = Self::validated_status(status)?;
        let id = self.repo.create_status(&status)?;
        log::info!("created order status '{}'", status.name);
        self.notify(Table::OrderStatuses, Action::Insert, id);
        Ok(id)
    }

    /// Renaming does not rewrite the status stored on existing orders.
    pub fn update_status(
        &self,
        id: Uuid,
        patch: OrderStatusPatch,
    ) -> Result<OrderStatus, DomainError> {
        let current = self.find_status(id)?;
        let status = Self::validated_status(NewOrderStatus {
            name: patch.name.unwrap_or(current.name),
            color: patch.color.unwrap_or(current.color),
        })?;
        if !self.repo.update_status(id, &status)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::OrderStatuses, Action::Update, id);
        self.find_status(id)
    }

    pub fn delete_status(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_status(id)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::OrderStatuses, Action::Delete, id);
        Ok(())
    }

    /// Moves a status one step up or down the list and returns the new order.
    /// Moving past either end leaves the list unchanged.
    pub fn move_status(
        &self,
        id: Uuid,
        direction: MoveDirection,
    ) -> Result<Vec<OrderStatus>, DomainError> {
        let statuses = self.repo.statuses()?;
        let Some(partner) = swap_partner(&statuses, id, direction)? else {
            return Ok(statuses);
        };
        let partner_id = partner.id;

        self.repo.swap_status_positions(id, partner_id)?;
        self.notify(Table::OrderStatuses, Action::Update, id);
        self.notify(Table::OrderStatuses, Action::Update, partner_id);
        self.repo.statuses()
    }

    fn find_status(&self, id: Uuid) -> Result<OrderStatus, DomainError> {
        self.repo
            .statuses()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(DomainError::NotFound)
    }

    fn validated_discount(discount: NewDiscount) -> Result<NewDiscount, DomainError> {
        validate_discount_percent(&discount.percentage)?;
        Ok(NewDiscount {
            name: validate_name(&discount.name)?,
            ..discount
        })
    }

    fn validated_status(status: NewOrderStatus) -> Result<NewOrderStatus, DomainError> {
        Ok(NewOrderStatus {
            name: validate_name(&status.name)?,
            color: non_blank(status.color),
        })
    }

    fn notify(&self, table: Table, action: Action, id: Uuid) {
        self.feed.publish(ChangeEvent::new(table, action, id));
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use uuid::Uuid;

    use super::SettingsService;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::SettingsRepository;
    use crate::domain::settings::{
        Discount, DiscountPatch, MoveDirection, NewDiscount, NewOrderStatus, OrderStatus,
        OrderStatusPatch,
    };
    use crate::realtime::ChangeFeed;

    #[derive(Default)]
    struct InMemorySettings {
        discounts: Mutex<Vec<Discount>>,
        statuses: Mutex<Vec<OrderStatus>>,
    }

    impl SettingsRepository for InMemorySettings {
        fn discounts(&self) -> Result<Vec<Discount>, DomainError> {
            Ok(self.discounts.lock().expect("lock").clone())
        }

        fn find_discount(&self, id: Uuid) -> Result<Option<Discount>, DomainError> {
            Ok(self
                .discounts
                .lock()
                .expect("lock")
                .iter()
                .find(|d| d.id == id)
                .cloned())
        }

        fn create_discount(&self, discount: &NewDiscount) -> Result<Uuid, DomainError> {
            let id = Uuid::new_v4();
            self.discounts.lock().expect("lock").push(Discount {
                id,
                name: discount.name.clone(),
                percentage: discount.percentage.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        }

        fn update_discount(&self, id: Uuid, discount: &NewDiscount) -> Result<bool, DomainError> {
            let mut discounts = self.discounts.lock().expect("lock");
            Ok(match discounts.iter_mut().find(|d| d.id == id) {
                Some(d) => {
                    d.name = discount.name.clone();
                    d.percentage = discount.percentage.clone();
                    true
                }
                None => false,
            })
        }

        fn delete_discount(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut discounts = self.discounts.lock().expect("lock");
            let before = discounts.len();
            discounts.retain(|d| d.id != id);
            Ok(discounts.len() < before)
        }

        fn statuses(&self) -> Result<Vec<OrderStatus>, DomainError> {
            let mut statuses = self.statuses.lock().expect("lock").clone();
            statuses.sort_by_key(|s| s.position);
            Ok(statuses)
        }

        fn create_status(&self, status: &NewOrderStatus) -> Result<Uuid, DomainError> {
            let mut statuses = self.statuses.lock().expect("lock");
            if statuses.iter().any(|s| s.name == status.name) {
                return Err(DomainError::Conflict("duplicate status name".into()));
            }
            let position = statuses.iter().map(|s| s.position).max().unwrap_or(0) + 1;
            let id = Uuid::new_v4();
            statuses.push(OrderStatus {
                id,
                name: status.name.clone(),
                color: status.color.clone(),
                position,
                created_at: Utc::now(),
            });
            Ok(id)
        }

        fn update_status(&self, id: Uuid, status: &NewOrderStatus) -> Result<bool, DomainError> {
            let mut statuses = self.statuses.lock().expect("lock");
            Ok(match statuses.iter_mut().find(|s| s.id == id) {
                Some(s) => {
                    s.name = status.name.clone();
                    s.color = status.color.clone();
                    true
                }
                None => false,
            })
        }

        fn delete_status(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut statuses = self.statuses.lock().expect("lock");
            let before = statuses.len();
            statuses.retain(|s| s.id != id);
            Ok(statuses.len() < before)
        }

        fn swap_status_positions(&self, a: Uuid, b: Uuid) -> Result<(), DomainError> {
            let mut statuses = self.statuses.lock().expect("lock");
            let position = |id: Uuid| {
                statuses
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.position)
                    .ok_or(DomainError::NotFound)
            };
            let (pa, pb) = (position(a)?, position(b)?);
            for s in statuses.iter_mut() {
                if s.id == a {
                    s.position = pb;
                } else if s.id == b {
                    s.position = pa;
                }
            }
            Ok(())
        }
    }

    fn service() -> SettingsService<InMemorySettings> {
        SettingsService::new(InMemorySettings::default(), ChangeFeed::default())
    }

    fn status(name: &str) -> NewOrderStatus {
        NewOrderStatus {
            name: name.into(),
            color: Some("#22c55e".into()),
        }
    }

    fn names(statuses: &[OrderStatus]) -> Vec<&str> {
        statuses.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn move_swaps_with_neighbour() {
        let svc = service();
        svc.create_status(status("new")).expect("create");
        let ready = svc.create_status(status("ready")).expect("create");
        svc.create_status(status("delivered")).expect("create");

        let moved = svc.move_status(ready, MoveDirection::Up).expect("move");
        assert_eq!(names(&moved), vec!["ready", "new", "delivered"]);

        let moved = svc.move_status(ready, MoveDirection::Down).expect("move");
        assert_eq!(names(&moved), vec!["new", "ready", "delivered"]);
    }

    #[test]
    fn move_past_the_edge_is_a_no_op() {
        let svc = service();
        let first = svc.create_status(status("new")).expect("create");
        svc.create_status(status("ready")).expect("create");

        let moved = svc.move_status(first, MoveDirection::Up).expect("move");
        assert_eq!(names(&moved), vec!["new", "ready"]);
        assert!(matches!(
            svc.move_status(Uuid::new_v4(), MoveDirection::Down),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn status_update_can_clear_color() {
        let svc = service();
        let id = svc.create_status(status("new")).expect("create");
        let updated = svc
            .update_status(
                id,
                OrderStatusPatch {
                    name: Some("nuovo".into()),
                    color: Some(None),
                },
            )
            .expect("update");
        assert_eq!(updated.name, "nuovo");
        assert_eq!(updated.color, None);
    }

    #[test]
    fn discount_percentage_is_bounded() {
        let svc = service();
        let err = svc
            .create_discount(NewDiscount {
                name: "Fedeltà".into(),
                percentage: BigDecimal::from(101),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let id = svc
            .create_discount(NewDiscount {
                name: "Fedeltà".into(),
                percentage: BigDecimal::from(10),
            })
            .expect("create");
        let updated = svc
            .update_discount(
                id,
                DiscountPatch {
                    percentage: Some(BigDecimal::from_str("12.5").expect("decimal")),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.name, "Fedeltà");
        assert_eq!(updated.percentage, BigDecimal::from_str("12.5").expect("decimal"));

        let err = svc
            .update_discount(
                id,
                DiscountPatch {
                    percentage: Some(BigDecimal::from_str("12.345").expect("decimal")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
