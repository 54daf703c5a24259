pub mod application;
pub mod autosave;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod geocoding;
pub mod handlers;
pub mod infrastructure;
pub mod realtime;
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::{CatalogService, CustomerService, OrderService, SettingsService, UserService};
use autosave::AutosaveQueue;
use errors::AppError;
use geocoding::GeocodingClient;
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::customer_repo::DieselCustomerRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::settings_repo::DieselSettingsRepository;
use infrastructure::user_repo::DieselUserRepository;
use realtime::ChangeFeed;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migrations", applied.len());
    Ok(())
}

/// Everything the handlers share: one service per area, all publishing on
/// the same change feed.
pub struct AppState {
    pub orders: Arc<OrderService<DieselOrderRepository>>,
    pub customers: CustomerService<DieselCustomerRepository>,
    pub catalog: CatalogService<DieselCatalogRepository>,
    pub settings: SettingsService<DieselSettingsRepository>,
    pub users: UserService<DieselUserRepository>,
    pub autosave: AutosaveQueue,
    pub feed: ChangeFeed,
    pub geocoder: GeocodingClient,
}

impl AppState {
    pub fn new(pool: DbPool, geocoder: GeocodingClient, autosave_debounce: Duration) -> Self {
        let feed = ChangeFeed::default();
        let orders = Arc::new(OrderService::new(
            DieselOrderRepository::new(pool.clone()),
            feed.clone(),
        ));
        let autosave = AutosaveQueue::new(orders.clone(), autosave_debounce);

        Self {
            orders,
            customers: CustomerService::new(DieselCustomerRepository::new(pool.clone()), feed.clone()),
            catalog: CatalogService::new(DieselCatalogRepository::new(pool.clone()), feed.clone()),
            settings: SettingsService::new(DieselSettingsRepository::new(pool.clone()), feed.clone()),
            users: UserService::new(DieselUserRepository::new(pool), feed.clone()),
            autosave,
            feed,
            geocoder,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::update_order,
        handlers::orders::delete_order,
        handlers::orders::add_line,
        handlers::orders::update_line,
        handlers::orders::delete_line,
        handlers::orders::add_note,
        handlers::orders::delete_note,
        handlers::orders::get_order_totals,
        handlers::orders::autosave_order,
        handlers::orders::order_events,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::list_customers,
        handlers::customers::list_clienti,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::customers::list_addresses,
        handlers::customers::create_address,
        handlers::customers::update_address,
        handlers::customers::delete_address,
        handlers::customers::customer_events,
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::rename_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_service_types,
        handlers::catalog::create_service_type,
        handlers::catalog::delete_service_type,
        handlers::catalog::list_services,
        handlers::catalog::get_service,
        handlers::catalog::create_service,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,
        handlers::settings::list_discounts,
        handlers::settings::create_discount,
        handlers::settings::update_discount,
        handlers::settings::delete_discount,
        handlers::settings::list_statuses,
        handlers::settings::create_status,
        handlers::settings::update_status,
        handlers::settings::delete_status,
        handlers::settings::move_status,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::addresses::autocomplete,
        handlers::events::all_events,
    ),
    tags(
        (name = "orders", description = "Order aggregate editor"),
        (name = "customers", description = "Customers and their addresses"),
        (name = "catalog", description = "Categories, service types and priced services"),
        (name = "settings", description = "Discounts and order statuses"),
        (name = "users", description = "Back-office users"),
        (name = "addresses", description = "Address autocomplete"),
        (name = "events", description = "Change notifications"),
    )
)]
pub struct ApiDoc;

/// Malformed JSON, query strings and path segments become 400s with the
/// same `{"error": ...}` body as every other failure.
fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    );
}

/// Registers every route of the service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::{addresses, catalog, customers, events, orders, settings, users};

    extractor_config(cfg);
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::patch().to(orders::update_order))
            .route("/{id}", web::delete().to(orders::delete_order))
            .route("/{id}/lines", web::post().to(orders::add_line))
            .route("/{id}/lines/{line_id}", web::patch().to(orders::update_line))
            .route("/{id}/lines/{line_id}", web::delete().to(orders::delete_line))
            .route("/{id}/notes", web::post().to(orders::add_note))
            .route("/{id}/notes/{index}", web::delete().to(orders::delete_note))
            .route("/{id}/totals", web::get().to(orders::get_order_totals))
            .route("/{id}/autosave", web::put().to(orders::autosave_order))
            .route("/{id}/events", web::get().to(orders::order_events)),
    )
    .service(
        web::scope("/customers")
            .route("", web::post().to(customers::create_customer))
            .route("", web::get().to(customers::list_customers))
            .route("/{id}", web::get().to(customers::get_customer))
            .route("/{id}", web::patch().to(customers::update_customer))
            .route("/{id}", web::delete().to(customers::delete_customer))
            .route("/{id}/addresses", web::get().to(customers::list_addresses))
            .route("/{id}/addresses", web::post().to(customers::create_address))
            .route(
                "/{id}/addresses/{address_id}",
                web::patch().to(customers::update_address),
            )
            .route(
                "/{id}/addresses/{address_id}",
                web::delete().to(customers::delete_address),
            )
            .route("/{id}/events", web::get().to(customers::customer_events)),
    )
    .route("/api/clienti", web::get().to(customers::list_clienti))
    .service(
        web::scope("/catalog")
            .route("/categories", web::get().to(catalog::list_categories))
            .route("/categories", web::post().to(catalog::create_category))
            .route("/categories/{id}", web::patch().to(catalog::rename_category))
            .route("/categories/{id}", web::delete().to(catalog::delete_category))
            .route("/service-types", web::get().to(catalog::list_service_types))
            .route("/service-types", web::post().to(catalog::create_service_type))
            .route(
                "/service-types/{id}",
                web::delete().to(catalog::delete_service_type),
            )
            .route("/services", web::get().to(catalog::list_services))
            .route("/services", web::post().to(catalog::create_service))
            .route("/services/{id}", web::get().to(catalog::get_service))
            .route("/services/{id}", web::patch().to(catalog::update_service))
            .route("/services/{id}", web::delete().to(catalog::delete_service)),
    )
    .service(
        web::scope("/discounts")
            .route("", web::get().to(settings::list_discounts))
            .route("", web::post().to(settings::create_discount))
            .route("/{id}", web::patch().to(settings::update_discount))
            .route("/{id}", web::delete().to(settings::delete_discount)),
    )
    .service(
        web::scope("/order-statuses")
            .route("", web::get().to(settings::list_statuses))
            .route("", web::post().to(settings::create_status))
            .route("/{id}", web::patch().to(settings::update_status))
            .route("/{id}", web::delete().to(settings::delete_status))
            .route("/{id}/move", web::post().to(settings::move_status)),
    )
    .service(
        web::scope("/users")
            .route("", web::get().to(users::list_users))
            .route("", web::post().to(users::create_user))
            .route("/{id}", web::get().to(users::get_user))
            .route("/{id}", web::patch().to(users::update_user))
            .route("/{id}", web::delete().to(users::delete_user)),
    )
    .route(
        "/addresses/autocomplete",
        web::get().to(addresses::autocomplete),
    )
    .route("/events", web::get().to(events::all_events));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn openapi_documents_the_main_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/orders",
            "/orders/{id}",
            "/orders/{id}/totals",
            "/orders/{id}/autosave",
            "/api/clienti",
            "/order-statuses/{id}/move",
            "/addresses/autocomplete",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
