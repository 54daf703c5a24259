use uuid::Uuid;

use crate::domain::catalog::{
    validate_name, validate_price, Category, NewService, Service, ServicePatch, ServiceQuery,
    ServiceType,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::domain::search;
use crate::realtime::{Action, ChangeEvent, ChangeFeed, Table};

/// Categories, service types and the priced services that order lines refer to.
pub struct CatalogService<R> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub fn categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.categories()
    }

    pub fn create_category(&self, name: &str) -> Result<Uuid, DomainError> {
        let id = self.repo.create_category(&validate_name(name)?)?;
        self.notify(Table::Categories, Action::Insert, id);
        Ok(id)
    }

    pub fn rename_category(&self, id: Uuid, name: &str) -> Result<(), DomainError> {
        if !self.repo.rename_category(id, &validate_name(name)?)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Categories, Action::Update, id);
        Ok(())
    }

    /// Services of a deleted category stay in the catalog, uncategorised.
    pub fn delete_category(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_category(id)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Categories, Action::Delete, id);
        Ok(())
    }

    pub fn service_types(&self) -> Result<Vec<ServiceType>, DomainError> {
        self.repo.service_types()
    }

    pub fn create_service_type(&self, name: &str) -> Result<Uuid, DomainError> {
        let id = self.repo.create_service_type(&validate_name(name)?)?;
        self.notify(Table::ServiceTypes, Action::Insert, id);
        Ok(id)
    }

    pub fn delete_service_type(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_service_type(id)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::ServiceTypes, Action::Delete, id);
        Ok(())
    }

    pub fn list_services(&self, query: &ServiceQuery) -> Result<Vec<Service>, DomainError> {
        let services = self.repo.services(query.category_id)?;
        Ok(match query.search.as_deref() {
            Some(q) => services
                .into_iter()
                .filter(|s| search::matches(&s.name, q))
                .collect(),
            None => services,
        })
    }

    pub fn get_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
        self.repo.find_service(id)
    }

    pub fn create_service(&self, service: NewService) -> Result<Uuid, DomainError> {
        let service = Self::validated(service)?;
        let id = self.repo.create_service(&service)?;
        log::info!("created service {id} '{}'", service.name);
        self.notify(Table::Services, Action::Insert, id);
        Ok(id)
    }

    /// Price changes apply to lines added afterwards; existing lines keep
    /// the price they were created with.
    pub fn update_service(&self, id: Uuid, patch: ServicePatch) -> Result<Service, DomainError> {
        let current = self.repo.find_service(id)?.ok_or(DomainError::NotFound)?;
        let service = Self::validated(NewService {
            name: patch.name.unwrap_or(current.name),
            category_id: patch.category_id.unwrap_or(current.category_id),
            service_type_id: patch.service_type_id.unwrap_or(current.service_type_id),
            price: patch.price.unwrap_or(current.price),
        })?;
        if !self.repo.update_service(id, &service)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Services, Action::Update, id);
        self.repo.find_service(id)?.ok_or(DomainError::NotFound)
    }

    /// Fails with a conflict while any order line still uses the service.
    pub fn delete_service(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_service(id)? {
            return Err(DomainError::NotFound);
        }
        self.notify(Table::Services, Action::Delete, id);
        Ok(())
    }

    fn validated(service: NewService) -> Result<NewService, DomainError> {
        validate_price(&service.price)?;
        Ok(NewService {
            name: validate_name(&service.name)?,
            ..service
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

    use super::CatalogService;
    use crate::domain::catalog::{
        Category, NewService, Service, ServicePatch, ServiceQuery, ServiceType,
    };
    use crate::domain::errors::DomainError;
    use crate::domain::ports::CatalogRepository;
    use crate::realtime::ChangeFeed;

    #[derive(Default)]
    struct InMemoryCatalog {
        categories: Mutex<Vec<Category>>,
        services: Mutex<Vec<Service>>,
    }

    impl CatalogRepository for InMemoryCatalog {
        fn categories(&self) -> Result<Vec<Category>, DomainError> {
            Ok(self.categories.lock().expect("lock").clone())
        }

        fn create_category(&self, name: &str) -> Result<Uuid, DomainError> {
            let id = Uuid::new_v4();
            self.categories.lock().expect("lock").push(Category {
                id,
                name: name.into(),
                created_at: Utc::now(),
            });
            Ok(id)
        }

        fn rename_category(&self, id: Uuid, name: &str) -> Result<bool, DomainError> {
            let mut categories = self.categories.lock().expect("lock");
            Ok(match categories.iter_mut().find(|c| c.id == id) {
                Some(c) => {
                    c.name = name.into();
                    true
                }
                None => false,
            })
        }

        fn delete_category(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut categories = self.categories.lock().expect("lock");
            let before = categories.len();
            categories.retain(|c| c.id != id);
            Ok(categories.len() < before)
        }

        fn service_types(&self) -> Result<Vec<ServiceType>, DomainError> {
            Ok(vec![])
        }

        fn create_service_type(&self, _name: &str) -> Result<Uuid, DomainError> {
            Ok(Uuid::new_v4())
        }

        fn delete_service_type(&self, _id: Uuid) -> Result<bool, DomainError> {
            Ok(false)
        }

        fn services(&self, category_id: Option<Uuid>) -> Result<Vec<Service>, DomainError> {
            Ok(self
                .services
                .lock()
                .expect("lock")
                .iter()
                .filter(|s| category_id.is_none() || s.category_id == category_id)
                .cloned()
                .collect())
        }

        fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
            Ok(self
                .services
                .lock()
                .expect("lock")
                .iter()
                .find(|s| s.id == id)
                .cloned())
        }

        fn create_service(&self, service: &NewService) -> Result<Uuid, DomainError> {
            let id = Uuid::new_v4();
            self.services.lock().expect("lock").push(Service {
                id,
                name: service.name.clone(),
                category_id: service.category_id,
                service_type_id: service.service_type_id,
                price: service.price.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            Ok(id)
        }

        fn update_service(&self, id: Uuid, service: &NewService) -> Result<bool, DomainError> {
            let mut services = self.services.lock().expect("lock");
            Ok(match services.iter_mut().find(|s| s.id == id) {
                Some(s) => {
                    s.name = service.name.clone();
                    s.category_id = service.category_id;
                    s.service_type_id = service.service_type_id;
                    s.price = service.price.clone();
                    true
                }
                None => false,
            })
        }

        fn delete_service(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut services = self.services.lock().expect("lock");
            let before = services.len();
            services.retain(|s| s.id != id);
            Ok(services.len() < before)
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("decimal")
    }

    fn service() -> CatalogService<InMemoryCatalog> {
        CatalogService::new(InMemoryCatalog::default(), ChangeFeed::default())
    }

    fn priced(name: &str, category_id: Option<Uuid>) -> NewService {
        NewService {
            name: name.into(),
            category_id,
            service_type_id: None,
            price: dec("4.00"),
        }
    }

    #[test]
    fn services_are_filtered_by_category_and_accentless_search() {
        let svc = service();
        let shirts = svc.create_category("Camicie").expect("category");
        svc.create_service(priced("Camicia stirata", Some(shirts)))
            .expect("service");
        svc.create_service(priced("Piumone matrimoniale", None))
            .expect("service");
        svc.create_service(priced("Pulitura a secco cappotto", None))
            .expect("service");

        let by_category = svc
            .list_services(&ServiceQuery {
                category_id: Some(shirts),
                search: None,
            })
            .expect("list");
        assert_eq!(by_category.len(), 1);

        let by_name = svc
            .list_services(&ServiceQuery {
                category_id: None,
                search: Some("PIUMÒNE".into()),
            })
            .expect("list");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Piumone matrimoniale");
    }

    #[test]
    fn blank_names_and_negative_prices_are_rejected() {
        let svc = service();
        assert!(matches!(
            svc.create_category("   "),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.create_service(NewService {
                price: dec("-1"),
                ..priced("Tenda", None)
            }),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn prices_must_fit_cents_and_column_width() {
        let svc = service();
        for price in ["100000000", "3.999"] {
            assert!(matches!(
                svc.create_service(NewService {
                    price: dec(price),
                    ..priced("Tappeto", None)
                }),
                Err(DomainError::InvalidInput(_))
            ));
        }
        svc.create_service(NewService {
            price: dec("99999999.99"),
            ..priced("Tappeto persiano", None)
        })
        .expect("largest price");
    }

    #[test]
    fn update_merges_patch_over_current_values() {
        let svc = service();
        let shirts = svc.create_category("Camicie").expect("category");
        let id = svc
            .create_service(priced("Camicia", Some(shirts)))
            .expect("service");

        let updated = svc
            .update_service(
                id,
                ServicePatch {
                    price: Some(dec("4.50")),
                    category_id: Some(None),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.name, "Camicia");
        assert_eq!(updated.price, dec("4.50"));
        assert_eq!(updated.category_id, None);

        assert!(matches!(
            svc.update_service(Uuid::new_v4(), ServicePatch::default()),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn rename_of_missing_category_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.rename_category(Uuid::new_v4(), "Tende"),
            Err(DomainError::NotFound)
        ));
    }
}
