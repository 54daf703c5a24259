use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::customer::{Address, Customer, CustomerQuery, NewAddress, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::ports::CustomerRepository;
use crate::domain::search::{like_pattern, tokens};
use crate::domain::ListResult;
use crate::schema::{addresses, customers, orders};

use super::models::{AddressChangeset, AddressRow, CustomerRow, CustomerValues, NewAddressRow};

pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn values(customer: &NewCustomer) -> CustomerValues {
    CustomerValues {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        marketing_email: customer.marketing_email,
        marketing_sms: customer.marketing_sms,
        search_text: customer.search_key(),
        updated_at: Utc::now(),
    }
}

fn filtered(query: &CustomerQuery) -> customers::BoxedQuery<'static, Pg> {
    let mut q = customers::table.into_boxed();
    for token in query.search.as_deref().map(tokens).unwrap_or_default() {
        q = q.filter(customers::search_text.like(like_pattern(&token)).escape('!'));
    }
    q
}

impl CustomerRepository for DieselCustomerRepository {
    fn create(&self, customer: &NewCustomer) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(customers::table)
            .values((customers::id.eq(id), &values(customer)))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Customer::from))
    }

    fn update(&self, id: Uuid, customer: &NewCustomer) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(customers::table.find(id))
            .set(&values(customer))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete(&self, id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let address_ids: Vec<Uuid> = addresses::table
                .filter(addresses::customer_id.eq(id))
                .select(addresses::id)
                .load(conn)?;
            let affected: Vec<Uuid> = orders::table
                .filter(
                    orders::customer_id
                        .eq(id)
                        .or(orders::pickup_address_id.eq_any(&address_ids))
                        .or(orders::delivery_address_id.eq_any(&address_ids)),
                )
                .select(orders::id)
                .load(conn)?;

            let deleted = diesel::delete(customers::table.find(id)).execute(conn)?;
            Ok((deleted > 0).then_some(affected))
        })
    }

    fn list(&self, query: &CustomerQuery) -> Result<ListResult<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let page = query.pagination;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(query).count().get_result(conn)?;

            let rows = filtered(query)
                .select(CustomerRow::as_select())
                .order((customers::last_name.asc(), customers::first_name.asc()))
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            Ok(ListResult {
                items: rows.into_iter().map(Customer::from).collect(),
                total,
            })
        })
    }

    fn addresses(&self, customer_id: Uuid) -> Result<Vec<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(addresses::table
            .filter(addresses::customer_id.eq(customer_id))
            .order(addresses::created_at.asc())
            .select(AddressRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Address::from)
            .collect())
    }

    fn find_address(&self, id: Uuid) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(addresses::table
            .find(id)
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Address::from))
    }

    fn create_address(
        &self,
        customer_id: Uuid,
        address: &NewAddress,
    ) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(addresses::table)
            .values(&NewAddressRow {
                id,
                customer_id,
                address: address.address.clone(),
                details: address.details.clone(),
            })
            .execute(&mut conn)?;
        Ok(id)
    }

    fn update_address(&self, id: Uuid, address: &NewAddress) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(addresses::table.find(id))
            .set(&AddressChangeset {
                address: address.address.clone(),
                details: address.details.clone(),
            })
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_address(&self, id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let affected: Vec<Uuid> = orders::table
                .filter(
                    orders::pickup_address_id
                        .eq(id)
                        .or(orders::delivery_address_id.eq(id)),
                )
                .select(orders::id)
                .load(conn)?;

            let deleted = diesel::delete(addresses::table.find(id)).execute(conn)?;
            Ok((deleted > 0).then_some(affected))
        })
    }
}
