use std::io;

use actix_web::web;
use dotenvy::dotenv;
use laundry_backoffice::config::AppConfig;
use laundry_backoffice::geocoding::GeocodingClient;
use laundry_backoffice::{build_server, create_pool, run_migrations, AppState};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = create_pool(&config.database_url)
        .map_err(|e| startup_error("cannot create connection pool", e))?;
    run_migrations(&pool).map_err(|e| startup_error("migrations failed", e))?;

    let geocoder = GeocodingClient::new(
        config.geocoding_url.clone(),
        config.geocoding_country.clone(),
        &config.geocoding_user_agent,
    )
    .map_err(|e| startup_error("cannot build geocoding client", e))?;

    let state = web::Data::new(AppState::new(pool, geocoder, config.autosave_debounce));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
