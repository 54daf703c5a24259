use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Category, NewService, Service, ServiceType};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{categories, service_types, services};

use super::models::{CategoryRow, ServiceRow, ServiceTypeRow, ServiceValues};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn values(service: &NewService) -> ServiceValues {
    ServiceValues {
        name: service.name.clone(),
        category_id: service.category_id,
        service_type_id: service.service_type_id,
        price: service.price.clone(),
        updated_at: Utc::now(),
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(categories::table
            .order(categories::name.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Category::from)
            .collect())
    }

    fn create_category(&self, name: &str) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(categories::table)
            .values((categories::id.eq(id), categories::name.eq(name)))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn rename_category(&self, id: Uuid, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(categories::table.find(id))
            .set(categories::name.eq(name))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_category(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(categories::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn service_types(&self) -> Result<Vec<ServiceType>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(service_types::table
            .order(service_types::name.asc())
            .select(ServiceTypeRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(ServiceType::from)
            .collect())
    }

    fn create_service_type(&self, name: &str) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(service_types::table)
            .values((service_types::id.eq(id), service_types::name.eq(name)))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn delete_service_type(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(service_types::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn services(&self, category_id: Option<Uuid>) -> Result<Vec<Service>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = services::table.into_boxed();
        if let Some(category_id) = category_id {
            query = query.filter(services::category_id.eq(category_id));
        }
        Ok(query
            .order(services::name.asc())
            .select(ServiceRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Service::from)
            .collect())
    }

    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(services::table
            .find(id)
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Service::from))
    }

    fn create_service(&self, service: &NewService) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        let id = Uuid::new_v4();
        diesel::insert_into(services::table)
            .values((services::id.eq(id), &values(service)))
            .execute(&mut conn)?;
        Ok(id)
    }

    fn update_service(&self, id: Uuid, service: &NewService) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(services::table.find(id))
            .set(&values(service))
            .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_service(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(services::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
