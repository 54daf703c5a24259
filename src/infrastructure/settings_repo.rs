use diesel::dsl::max;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::SettingsRepository;
use crate::domain::settings::{Discount, NewDiscount, NewOrderStatus, OrderStatus};
use crate::schema::{discounts, order_statuses};

use super::models::{DiscountRow, OrderStatusRow};

pub struct DieselSettingsRepository {
    pool: DbPool,
}

impl DieselSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SettingsRepository for DieselSettingsRepository {
    fn discounts(&self) -> Result<Vec<Discount>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(discounts::table
            .order(discounts::percentage.asc())
            .select(DiscountRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Discount::from)
            .collect())
    }

    fn find_discount(&self, id: Uuid) -> Result<Option<Discount>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(discounts::table
            .find(id)
            .select(DiscountRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Discount::from))
    }

    fn create_discount(&self, discount: &NewDiscount) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(discounts::table)
            .values((
                discounts::id.eq(id),
                discounts::name.eq(&discount.name),
                discounts::percentage.eq(&discount.percentage),
            ))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn update_discount(&self, id: Uuid, discount: &NewDiscount) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(discounts::table.find(id))
            .set((
                discounts::name.eq(&discount.name),
                discounts::percentage.eq(&discount.percentage),
            ))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_discount(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(discounts::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn statuses(&self) -> Result<Vec<OrderStatus>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(order_statuses::table
            .order(order_statuses::position.asc())
            .select(OrderStatusRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(OrderStatus::from)
            .collect())
    }

    fn create_status(&self, status: &NewOrderStatus) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let last: Option<i32> = order_statuses::table
                .select(max(order_statuses::position))
                .first(conn)?;

            let id = Uuid::new_v4();
            diesel::insert_into(order_statuses::table)
                .values((
                    order_statuses::id.eq(id),
                    order_statuses::name.eq(&status.name),
                    order_statuses::color.eq(&status.color),
                    order_statuses::position.eq(last.unwrap_or(0) + 1),
                ))
                .execute(conn)?;
            Ok(id)
        })
    }

    fn update_status(&self, id: Uuid, status: &NewOrderStatus) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(order_statuses::table.find(id))
            .set((
                order_statuses::name.eq(&status.name),
                order_statuses::color.eq(&status.color),
            ))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_status(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(order_statuses::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn swap_status_positions(&self, a: Uuid, b: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let pos_a: i32 = order_statuses::table
                .find(a)
                .select(order_statuses::position)
                .first(conn)?;
            let pos_b: i32 = order_statuses::table
                .find(b)
                .select(order_statuses::position)
                .first(conn)?;

            diesel::update(order_statuses::table.find(a))
                .set(order_statuses::position.eq(pos_b))
                .execute(conn)?;
            diesel::update(order_statuses::table.find(b))
                .set(order_statuses::position.eq(pos_a))
                .execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DieselSettingsRepository;
    use crate::domain::ports::SettingsRepository;
    use crate::domain::settings::NewOrderStatus;
    use crate::infrastructure::test_db::setup_db;

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn new_status_is_appended_and_swappable() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSettingsRepository::new(pool);

        let id = repo
            .create_status(&NewOrderStatus {
                name: "cancelled".into(),
                color: None,
            })
            .expect("create");
        let statuses = repo.statuses().expect("list");
        assert_eq!(statuses.last().map(|s| s.id), Some(id));

        let before_last = statuses[statuses.len() - 2].id;
        repo.swap_status_positions(id, before_last).expect("swap");

        let names: Vec<String> = repo
            .statuses()
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["new", "in_progress", "ready", "cancelled", "delivered"]);
    }

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn duplicate_status_name_is_a_conflict() {
        let (_container, pool) = setup_db().await;
        let repo = DieselSettingsRepository::new(pool);

        let err = repo
            .create_status(&NewOrderStatus {
                name: "new".into(),
                color: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::domain::errors::DomainError::Conflict(_)
        ));
    }
}
