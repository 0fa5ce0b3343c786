//! Core library for the weather aggregation service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Adapters and normalizers for the OpenWeatherMap and WeatherAPI.com providers
//! - Aggregation of both providers' readings, with fallback data when one fails
//! - The per-query cache and the fixed-window rate limiter
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod model;
pub mod provider;
pub mod rate_limit;
pub mod service;

pub use config::{CacheConfig, Config, ProviderConfig, RateLimitConfig, ServerConfig};
pub use error::{ProviderError, ServiceError};
pub use model::{
    CurrentConditions, ForecastDay, ForecastLocation, ForecastRecord, Location, LocationCandidate,
    LocationData, WeatherRecord,
};
pub use provider::{ProviderId, WeatherProvider};
pub use rate_limit::{EndpointCategory, RateLimiter};
pub use service::WeatherService;
