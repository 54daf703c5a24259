use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::customer::{display_name, Address, CustomerSummary};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    LineItemView, NewLineItem, NewOrder, Note, OrderPatch, OrderQuery, OrderRecord, OrderSummary,
};
use crate::domain::ports::OrderRepository;
use crate::domain::search::{like_pattern, tokens};
use crate::domain::totals::OrderTotals;
use crate::domain::ListResult;
use crate::schema::{addresses, customers, order_line_items, order_statuses, orders, services};

use super::models::{
    AddressRow, LineItemRow, NewLineItemRow, NewOrderRow, OrderChangeset, OrderRow,
};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// The filtered (but unpaginated) order query; built once for the count and
/// once for the page since boxed queries cannot be cloned.
fn filtered(query: &OrderQuery) -> orders::BoxedQuery<'static, Pg> {
    let mut q = orders::table.into_boxed();

    if let Some(status) = &query.status {
        q = q.filter(orders::status.eq(status.clone()));
    }
    if let Some(urgent) = query.urgent {
        q = q.filter(orders::urgent.eq(urgent));
    }

    let search_tokens = query.search.as_deref().map(tokens).unwrap_or_default();
    if !search_tokens.is_empty() {
        let mut matching = customers::table
            .select(customers::id.nullable())
            .into_boxed();
        for token in &search_tokens {
            matching = matching.filter(customers::search_text.like(like_pattern(token)).escape('!'));
        }
        q = q.filter(orders::customer_id.eq_any(matching));
    }
    q
}

fn to_line_view((row, service_name): (LineItemRow, String)) -> LineItemView {
    LineItemView {
        id: row.id,
        order_id: row.order_id,
        service_id: row.service_id,
        service_name,
        quantity: row.quantity,
        unit_price: row.unit_price,
        subtotal: row.subtotal,
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder, status: String) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id,
                status,
                urgent: order.urgent,
                customer_id: order.customer_id,
                payment_method: order.payment_method.map(|m| m.as_str().to_string()),
                discount_percent: order.discount_percent,
                notes: serde_json::Value::Array(vec![]),
            })
            .execute(&mut conn)?;
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderRecord>, DomainError> {
        let mut conn = self.pool.get()?;

        orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(OrderRecord::try_from)
            .transpose()
    }

    fn list(&self, query: &OrderQuery) -> Result<ListResult<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;
        let page = query.pagination;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(query).count().get_result(conn)?;

            let rows = filtered(query)
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            let customer_ids: Vec<Uuid> = rows.iter().filter_map(|o| o.customer_id).collect();
            let names: HashMap<Uuid, String> = customers::table
                .filter(customers::id.eq_any(&customer_ids))
                .select((customers::id, customers::first_name, customers::last_name))
                .load::<(Uuid, String, String)>(conn)?
                .into_iter()
                .map(|(id, first, last)| (id, display_name(&first, &last)))
                .collect();

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .map(|o| OrderSummary {
                        id: o.id,
                        customer_name: o.customer_id.and_then(|c| names.get(&c).cloned()),
                        status: o.status,
                        urgent: o.urgent,
                        customer_id: o.customer_id,
                        total: o.total,
                        created_at: o.created_at,
                    })
                    .collect(),
                total,
            })
        })
    }

    fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let changes = OrderChangeset {
            status: patch.status.clone(),
            urgent: patch.urgent,
            customer_id: patch.customer_id,
            pickup_address_id: patch.pickup_address_id,
            delivery_address_id: patch.delivery_address_id,
            payment_method: patch
                .payment_method
                .map(|m| m.map(|m| m.as_str().to_string())),
            discount_percent: patch.discount_percent.clone(),
            ..OrderChangeset::touch()
        };
        let updated = diesel::update(orders::table.find(id))
            .set(&changes)
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(orders::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn store_totals(&self, id: Uuid, totals: &OrderTotals) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let changes = OrderChangeset {
            subtotal: Some(totals.subtotal.clone()),
            total: Some(totals.total.clone()),
            ..OrderChangeset::touch()
        };
        diesel::update(orders::table.find(id))
            .set(&changes)
            .execute(&mut conn)?;
        Ok(())
    }

    fn replace_notes(&self, id: Uuid, notes: &[Note]) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let changes = OrderChangeset {
            notes: Some(serde_json::to_value(notes)?),
            ..OrderChangeset::touch()
        };
        let updated = diesel::update(orders::table.find(id))
            .set(&changes)
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn lines(&self, order_id: Uuid) -> Result<Vec<LineItemView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_line_items::table
            .inner_join(services::table)
            .filter(order_line_items::order_id.eq(order_id))
            .order(order_line_items::created_at.asc())
            .select((LineItemRow::as_select(), services::name))
            .load::<(LineItemRow, String)>(&mut conn)?;
        Ok(rows.into_iter().map(to_line_view).collect())
    }

    fn find_line(
        &self,
        order_id: Uuid,
        line_id: Uuid,
    ) -> Result<Option<LineItemView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = order_line_items::table
            .inner_join(services::table)
            .filter(order_line_items::id.eq(line_id))
            .filter(order_line_items::order_id.eq(order_id))
            .select((LineItemRow::as_select(), services::name))
            .first::<(LineItemRow, String)>(&mut conn)
            .optional()?;
        Ok(row.map(to_line_view))
    }

    fn insert_line(&self, order_id: Uuid, line: NewLineItem) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(order_line_items::table)
            .values(&NewLineItemRow {
                id,
                order_id,
                service_id: line.service_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .execute(&mut conn)?;
        Ok(id)
    }

    fn update_line(
        &self,
        line_id: Uuid,
        quantity: i32,
        subtotal: &BigDecimal,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::update(order_line_items::table.find(line_id))
            .set((
                order_line_items::quantity.eq(quantity),
                order_line_items::subtotal.eq(subtotal),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn delete_line(&self, line_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(order_line_items::table.find(line_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn service_price(&self, service_id: Uuid) -> Result<Option<BigDecimal>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(services::table
            .find(service_id)
            .select(services::price)
            .first::<BigDecimal>(&mut conn)
            .optional()?)
    }

    fn status_names(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(order_statuses::table
            .order(order_statuses::position.asc())
            .select(order_statuses::name)
            .load(&mut conn)?)
    }

    fn customer_summary(&self, id: Uuid) -> Result<Option<CustomerSummary>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .find(id)
            .select((
                customers::first_name,
                customers::last_name,
                customers::email,
                customers::phone,
            ))
            .first::<(String, String, Option<String>, Option<String>)>(&mut conn)
            .optional()?;
        Ok(row.map(|(first, last, email, phone)| CustomerSummary {
            id,
            name: display_name(&first, &last),
            email,
            phone,
        }))
    }

    fn address(&self, id: Uuid) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(addresses::table
            .find(id)
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Address::from))
    }
}
