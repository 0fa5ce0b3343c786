//! The fetch → normalize → aggregate pipeline behind every endpoint.
//!
//! Provider failures stop here: each one is logged and replaced by fallback
//! data, so callers only see [`ServiceError`] when something above the
//! providers breaks.

use std::sync::Arc;

use crate::{
    aggregate,
    cache::QueryCache,
    config::CacheConfig,
    error::{ProviderError, ServiceError},
    fallback,
    model::{ForecastRecord, LocationData, WeatherRecord, today},
    provider::{ProviderId, WeatherProvider},
};

#[derive(Debug)]
pub struct WeatherService {
    primary: Arc<dyn WeatherProvider>,
    secondary: Arc<dyn WeatherProvider>,
    current_cache: QueryCache<String, WeatherRecord>,
    forecast_cache: QueryCache<(String, u8), ForecastRecord>,
    search_cache: QueryCache<String, LocationData>,
}

impl WeatherService {
    /// `primary` supplies the aggregated record's location; `secondary` also
    /// serves forecasts.
    pub fn new(
        primary: Arc<dyn WeatherProvider>,
        secondary: Arc<dyn WeatherProvider>,
        cache: &CacheConfig,
    ) -> Self {
        let ttl = cache.ttl();
        Self {
            primary,
            secondary,
            current_cache: QueryCache::new("current", ttl, cache.max_entries),
            forecast_cache: QueryCache::new("forecast", ttl, cache.max_entries),
            search_cache: QueryCache::new("locations", ttl, cache.max_entries),
        }
    }

    /// Current conditions averaged across both providers.
    pub async fn current_weather(&self, location: &str) -> Result<WeatherRecord, ServiceError> {
        self.current_cache
            .get_or_compute(location.to_string(), || self.fetch_current(location))
            .await
    }

    /// Up to `days` days of forecast from the secondary provider.
    pub async fn forecast(&self, location: &str, days: u8) -> Result<ForecastRecord, ServiceError> {
        self.forecast_cache
            .get_or_compute((location.to_string(), days), || async {
                Ok::<_, ServiceError>(self.fetch_forecast(location, days).await)
            })
            .await
    }

    /// Candidates from both providers, primary first.
    pub async fn search_locations(&self, query: &str) -> Result<LocationData, ServiceError> {
        self.search_cache
            .get_or_compute(query.to_string(), || async {
                Ok::<_, ServiceError>(self.fetch_locations(query).await)
            })
            .await
    }

    async fn fetch_current(&self, location: &str) -> Result<WeatherRecord, ServiceError> {
        tracing::info!(location, "fetching current weather from both providers");

        let primary_task = spawn_current(Arc::clone(&self.primary), location.to_string());
        let secondary_task = spawn_current(Arc::clone(&self.secondary), location.to_string());
        let (primary, secondary) = tokio::join!(primary_task, secondary_task);

        let primary = primary.map_err(|source| ServiceError::TaskFailed {
            provider: self.primary.id(),
            source,
        })?;
        let secondary = secondary.map_err(|source| ServiceError::TaskFailed {
            provider: self.secondary.id(),
            source,
        })?;

        let primary = or_fallback_current(primary, location, self.primary.id());
        let secondary = or_fallback_current(secondary, location, self.secondary.id());

        Ok(aggregate::aggregate_current(primary, secondary))
    }

    async fn fetch_forecast(&self, location: &str, days: u8) -> ForecastRecord {
        tracing::info!(location, days, "fetching forecast");

        match self.secondary.forecast(location, days).await {
            Ok(record) => aggregate::limit_forecast(record, days),
            Err(err) => {
                tracing::warn!(error = %err, location, "forecast unavailable, using fallback");
                fallback::forecast(location, days, today())
            }
        }
    }

    async fn fetch_locations(&self, query: &str) -> LocationData {
        tracing::info!(query, "searching locations");

        let (primary, secondary) =
            tokio::join!(self.primary.search(query), self.secondary.search(query));

        let mut candidates = Vec::new();
        for result in [primary, secondary] {
            match result {
                Ok(found) => candidates.extend(found),
                Err(err) => tracing::warn!(error = %err, query, "location search failed"),
            }
        }

        if candidates.is_empty() {
            tracing::warn!(query, "no locations from any provider, using fallback");
            candidates = fallback::locations(query);
        }

        LocationData::new(candidates)
    }
}

fn spawn_current(
    provider: Arc<dyn WeatherProvider>,
    location: String,
) -> tokio::task::JoinHandle<Result<WeatherRecord, ProviderError>> {
    tokio::spawn(async move { provider.current(&location).await })
}

fn or_fallback_current(
    result: Result<WeatherRecord, ProviderError>,
    location: &str,
    provider: ProviderId,
) -> WeatherRecord {
    result.unwrap_or_else(|err| {
        tracing::warn!(
            error = %err,
            %provider,
            location,
            "current weather unavailable, using fallback"
        );
        fallback::current(location, provider)
    })
}
