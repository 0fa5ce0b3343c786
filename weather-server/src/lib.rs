//! HTTP front end for the weather aggregation service.
//!
//! Exposes `/weather/current`, `/weather/forecast`, `/locations/search` and
//! `/health` on Actix-Web. All provider work is delegated to
//! [`weather_core::WeatherService`].

mod handlers;
pub mod response;

use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use anyhow::Context;
use std::path::Path;
use weather_core::{
    Config, ProviderId, RateLimiter, WeatherService, provider::provider_from_config,
};

use crate::response::ApiResponse;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub service: WeatherService,
    /// One limiter for the whole process, shared by every worker.
    pub limiter: RateLimiter,
}

impl AppState {
    /// Builds both providers from `config`. Fails if either has no API key.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let primary = provider_from_config(ProviderId::OpenWeather, config)?;
        let secondary = provider_from_config(ProviderId::WeatherApi, config)?;

        Ok(Self {
            service: WeatherService::new(primary, secondary, &config.cache),
            limiter: RateLimiter::new(&config.rate_limit),
        })
    }
}

/// Load configuration from `path` (or the platform default) and apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    Ok(config)
}

/// Registers every route. Query strings that fail to deserialize (e.g. a
/// non-numeric `days`) are answered with a 400 envelope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let body = ApiResponse::<()>::error(err.to_string());
        let response = HttpResponse::BadRequest().json(body);
        InternalError::from_response(err, response).into()
    }))
    .route("/health", web::get().to(handlers::health))
    .service(
        web::scope("/weather")
            .route("/current", web::get().to(handlers::current_weather))
            .route("/forecast", web::get().to(handlers::forecast)),
    )
    .service(
        web::scope("/locations")
            .route("/search", web::get().to(handlers::search_locations)),
    );
}

/// Starts the HTTP server and runs until it is shut down.
///
/// The caller provides the Actix runtime (e.g. via `#[actix_web::main]`).
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = web::Data::new(AppState::from_config(&config)?);
    let bind = config.server.bind.clone();
    let port = config.server.port;

    tracing::info!(
        %bind,
        port,
        cache_ttl_secs = config.cache.ttl_secs,
        max_requests = config.rate_limit.max_requests,
        "starting weather aggregation server"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((bind.as_str(), port))
    .with_context(|| format!("Failed to bind {bind}:{port}"))?
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    Ok(())
}
