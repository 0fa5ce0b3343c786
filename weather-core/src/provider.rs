use crate::{
    Config, ForecastRecord, LocationCandidate, WeatherRecord,
    error::ProviderError,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    /// Short name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Source label reported in responses.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OpenWeatherMap",
            ProviderId::WeatherApi => "WeatherAPI",
        }
    }

    /// Source label for placeholder data substituted for this provider.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OpenWeather (Fallback)",
            ProviderId::WeatherApi => "WeatherAPI (Fallback)",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "https://api.openweathermap.org",
            ProviderId::WeatherApi => "http://api.weatherapi.com",
        }
    }

    /// Environment variable that overrides the configured API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// One upstream weather data source.
///
/// Every method issues exactly one outbound request and normalizes the body
/// into the shared model. Failures of any kind come back as [`ProviderError`];
/// nothing here retries.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current(&self, location: &str) -> Result<WeatherRecord, ProviderError>;

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, ProviderError>;

    async fn forecast(&self, _location: &str, _days: u8) -> Result<ForecastRecord, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.id(),
            operation: "forecast",
        })
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-server configure {id}` or set {}.",
            id.api_key_env()
        )
    })?;

    let base_url = config
        .provider_base_url(id)
        .unwrap_or(id.default_base_url());
    let http = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            Arc::new(OpenWeatherProvider::with_client(api_key.to_owned(), base_url, http))
        }
        ProviderId::WeatherApi => {
            Arc::new(WeatherApiProvider::with_client(api_key.to_owned(), base_url, http))
        }
    };

    Ok(provider)
}

/// Issue one GET and return the body text of a 2xx response.
pub(crate) async fn fetch_text(
    http: &Client,
    provider: ProviderId,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, ProviderError> {
    tracing::debug!(%provider, url, "sending provider request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| ProviderError::Request { provider, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ProviderError::Request { provider, source })?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status,
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

/// Synthetic candidate id for providers that do not assign one.
pub(crate) fn coordinate_id(lat: f64, lon: f64) -> String {
    format!("{lat},{lon}")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
