//! HTTP handler functions for the weather API.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use weather_core::{EndpointCategory, model::timestamp_now};

use crate::{
    AppState,
    response::{ApiResponse, HealthFeatures, HealthStatus},
};

const DEFAULT_FORECAST_DAYS: u8 = 5;
const MAX_FORECAST_DAYS: u8 = 10;

#[derive(Debug, Deserialize)]
pub struct CurrentParams {
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    location: Option<String>,
    days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "UP",
        timestamp: timestamp_now(),
        service: "Weather Aggregation API",
        version: env!("CARGO_PKG_VERSION"),
        features: HealthFeatures {
            caching: "ENABLED",
            sources: "OpenWeather, WeatherAPI",
            rate_limiting: "ENABLED",
        },
    })
}

/// `GET /weather/current`
///
/// Averages both providers' current conditions for `location`.
pub async fn current_weather(
    state: web::Data<AppState>,
    params: web::Query<CurrentParams>,
) -> HttpResponse {
    tracing::info!(location = ?params.location, "current weather request");

    if let Some(rejected) = enforce_rate_limit(&state, EndpointCategory::Weather) {
        return rejected;
    }

    let Some(location) = non_blank(params.location.as_deref()) else {
        return bad_request("Location parameter is required");
    };

    match state.service.current_weather(location).await {
        Ok(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        Err(e) => {
            tracing::error!(error = %e, location, "current weather failed");
            internal_error(format!("Error fetching weather data: {e}"))
        }
    }
}

/// `GET /weather/forecast`
///
/// Returns `days` (1 to 10, default 5) days of forecast for `location`.
pub async fn forecast(
    state: web::Data<AppState>,
    params: web::Query<ForecastParams>,
) -> HttpResponse {
    tracing::info!(location = ?params.location, days = ?params.days, "forecast request");

    if let Some(rejected) = enforce_rate_limit(&state, EndpointCategory::Weather) {
        return rejected;
    }

    let Some(location) = non_blank(params.location.as_deref()) else {
        return bad_request("Location parameter is required");
    };

    let Some(days) = parse_days(params.days.as_deref()) else {
        return bad_request("Days must be between 1 and 10");
    };

    match state.service.forecast(location, days).await {
        Ok(record) => HttpResponse::Ok().json(ApiResponse::success(record)),
        Err(e) => {
            tracing::error!(error = %e, location, days, "forecast failed");
            internal_error(format!("Error fetching forecast: {e}"))
        }
    }
}

/// `GET /locations/search`
pub async fn search_locations(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    tracing::info!(query = ?params.q, "location search request");

    if let Some(rejected) = enforce_rate_limit(&state, EndpointCategory::Locations) {
        return rejected;
    }

    let Some(query) = non_blank(params.q.as_deref()) else {
        return bad_request("Query parameter 'q' is required");
    };

    match state.service.search_locations(query).await {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data)),
        Err(e) => {
            tracing::error!(error = %e, query, "location search failed");
            internal_error(format!("Error searching locations: {e}"))
        }
    }
}

/// Counts the request against `category`; rejected requests get a 429.
fn enforce_rate_limit(state: &AppState, category: EndpointCategory) -> Option<HttpResponse> {
    if state.limiter.check(category) {
        return None;
    }
    let body = ApiResponse::<()>::error(state.limiter.rejection_message(category));
    Some(HttpResponse::TooManyRequests().json(body))
}

/// A missing or empty `days` means the default; anything else must be an
/// integer in `1..=10`.
fn parse_days(raw: Option<&str>) -> Option<u8> {
    let days = match non_blank(raw) {
        None => DEFAULT_FORECAST_DAYS,
        Some(raw) => raw.parse().ok()?,
    };
    (1..=MAX_FORECAST_DAYS).contains(&days).then_some(days)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest()
        .json(ApiResponse::<()>::error(message))
}

fn internal_error(message: String) -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(ApiResponse::<()>::error(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure_routes;
    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use weather_core::{
        Config, LocationCandidate, ProviderConfig, ProviderError, ProviderId, RateLimiter,
        WeatherProvider, WeatherRecord, WeatherService, provider::provider_from_config,
    };
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn openweather_current() -> Value {
        json!({
            "coord": { "lon": -0.13, "lat": 51.51 },
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "main": { "temp": 12.0, "feels_like": 10.0, "pressure": 1010, "humidity": 80 },
            "wind": { "speed": 5.0 },
            "sys": { "country": "GB" },
            "name": "London"
        })
    }

    fn weatherapi_current() -> Value {
        json!({
            "location": { "name": "London", "country": "United Kingdom",
                          "lat": 51.52, "lon": -0.11 },
            "current": { "temp_c": 14.0, "feelslike_c": 13.0, "humidity": 71, "pressure_mb": 1013.0,
                         "wind_kph": 36.0, "condition": { "text": "Overcast" } }
        })
    }

    fn weatherapi_forecast(available: usize) -> Value {
        let days: Vec<_> = (0..available)
            .map(|i| {
                json!({
                    "date": format!("2024-07-{:02}", i + 1),
                    "day": { "maxtemp_c": 25.0, "mintemp_c": 15.0, "avghumidity": 60,
                             "condition": { "text": "Sunny" } }
                })
            })
            .collect();
        json!({
            "location": { "name": "London", "country": "United Kingdom" },
            "forecast": { "forecastday": days }
        })
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        for name in ["openweather", "weatherapi"] {
            config.providers.insert(
                name.to_string(),
                ProviderConfig {
                    api_key: "KEY".into(),
                    base_url: Some(server.uri()),
                },
            );
        }
        config
    }

    async fn mount_current(server: &MockServer, openweather: ResponseTemplate, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(openweather)
            .expect(calls)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weatherapi_current()))
            .expect(calls)
            .mount(server)
            .await;
    }

    macro_rules! app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::from_config(&$config).unwrap()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_static_status() {
        let server = MockServer::start().await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "UP");
        assert_eq!(body["service"], "Weather Aggregation API");
        assert_eq!(body["features"]["caching"], "ENABLED");
        assert_eq!(body["features"]["sources"], "OpenWeather, WeatherAPI");
    }

    #[actix_web::test]
    async fn current_weather_aggregates_both_providers() {
        let server = MockServer::start().await;
        mount_current(
            &server,
            ResponseTemplate::new(200).set_body_json(openweather_current()),
            1,
        )
        .await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get()
            .uri("/weather/current?location=%20London%20")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["error"], Value::Null);
        let data = &body["data"];
        assert_eq!(data["location"]["name"], "London");
        assert_eq!(data["location"]["country"], "GB");
        assert_eq!(data["current"]["temperature"], 13.0);
        assert_eq!(data["current"]["feelsLike"], 11.5);
        assert_eq!(data["current"]["humidity"], 75);
        assert_eq!(data["current"]["pressure"], 1011);
        assert_eq!(data["current"]["windSpeed"], 7.5);
        assert_eq!(data["current"]["condition"], "Aggregated");
        assert_eq!(data["sources"], json!(["OpenWeatherMap", "WeatherAPI"]));
    }

    #[actix_web::test]
    async fn current_weather_degrades_when_a_provider_fails() {
        let server = MockServer::start().await;
        mount_current(&server, ResponseTemplate::new(503), 1).await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get()
            .uri("/weather/current?location=London")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(
            data["sources"],
            json!(["OpenWeather (Fallback)", "WeatherAPI"])
        );
        assert_eq!(data["current"]["temperature"], 17.0);
        assert_eq!(data["current"]["humidity"], 68);
        assert_eq!(data["location"]["country"], "N/A");
    }

    #[actix_web::test]
    async fn repeated_current_requests_are_served_from_cache() {
        let server = MockServer::start().await;
        mount_current(
            &server,
            ResponseTemplate::new(200).set_body_json(openweather_current()),
            1,
        )
        .await;
        let app = app!(config_for(&server));

        let first = test::call_and_read_body(
            &app,
            test::TestRequest::get()
                .uri("/weather/current?location=London")
                .to_request(),
        )
        .await;
        let second = test::call_and_read_body(
            &app,
            test::TestRequest::get()
                .uri("/weather/current?location=London")
                .to_request(),
        )
        .await;

        assert_eq!(first, second);
        server.verify().await;
    }

    #[derive(Debug)]
    struct CrashingProvider;

    #[async_trait]
    impl WeatherProvider for CrashingProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn current(&self, _location: &str) -> Result<WeatherRecord, ProviderError> {
            panic!("client crashed")
        }

        async fn search(&self, _query: &str) -> Result<Vec<LocationCandidate>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[actix_web::test]
    async fn crashed_provider_task_returns_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weatherapi_current()))
            .mount(&server)
            .await;
        let config = config_for(&server);
        let secondary = provider_from_config(ProviderId::WeatherApi, &config).unwrap();
        let state = AppState {
            service: WeatherService::new(Arc::new(CrashingProvider), secondary, &config.cache),
            limiter: RateLimiter::new(&config.rate_limit),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/weather/current?location=London")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        let message = body["error"].as_str().unwrap();
        assert!(
            message.starts_with("Error fetching weather data: "),
            "{message}"
        );
        assert!(
            message.contains("openweather task did not complete"),
            "{message}"
        );
    }

    #[actix_web::test]
    async fn blank_location_is_rejected_without_calling_providers() {
        let server = MockServer::start().await;
        mount_current(
            &server,
            ResponseTemplate::new(200).set_body_json(openweather_current()),
            0,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weatherapi_forecast(5)))
            .expect(0)
            .mount(&server)
            .await;
        let app = app!(config_for(&server));

        for uri in [
            "/weather/current?location=%20%20",
            "/weather/current",
            "/weather/forecast?location=&days=5",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["data"], Value::Null);
            assert_eq!(body["error"], "Location parameter is required");
        }
    }

    #[actix_web::test]
    async fn forecast_days_must_be_in_range() {
        let server = MockServer::start().await;
        let app = app!(config_for(&server));

        for days in ["0", "11", "-3", "abc", "2.5"] {
            let uri = format!("/weather/forecast?location=London&days={days}");
            let req = test::TestRequest::get().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "days={days}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Days must be between 1 and 10");
        }
    }

    #[actix_web::test]
    async fn empty_days_uses_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .and(query_param("days", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weatherapi_forecast(7)))
            .expect(1)
            .mount(&server)
            .await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get()
            .uri("/weather/forecast?location=London&days=")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["forecast"].as_array().unwrap().len(), 5);
        server.verify().await;
    }

    #[actix_web::test]
    async fn malformed_query_string_gets_error_envelope() {
        let server = MockServer::start().await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get()
            .uri("/locations/search?q=Paris&q=Lyon")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"].as_str().unwrap().contains("duplicate field"));
    }

    #[::core::prelude::v1::test]
    fn days_parsing() {
        assert_eq!(parse_days(None), Some(5));
        assert_eq!(parse_days(Some("")), Some(5));
        assert_eq!(parse_days(Some(" 7 ")), Some(7));
        assert_eq!(parse_days(Some("10")), Some(10));
        assert_eq!(parse_days(Some("0")), None);
        assert_eq!(parse_days(Some("300")), None);
        assert_eq!(parse_days(Some("five")), None);
    }

    #[actix_web::test]
    async fn forecast_returns_requested_days_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .and(query_param("days", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weatherapi_forecast(7)))
            .expect(1)
            .mount(&server)
            .await;
        let app = app!(config_for(&server));

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/weather/forecast?location=London")
                .to_request(),
        )
        .await;

        let days = body["data"]["forecast"].as_array().unwrap();
        assert_eq!(days.len(), 5);
        let dates: Vec<_> = days.iter().map(|d| d["date"].as_str().unwrap()).collect();
        assert_eq!(
            dates,
            ["2024-07-01", "2024-07-02", "2024-07-03", "2024-07-04", "2024-07-05"]
        );
        assert_eq!(days[0]["maxTemp"], 25.0);
        assert_eq!(body["data"]["sources"], json!(["WeatherAPI"]));
    }

    #[actix_web::test]
    async fn forecast_failure_returns_synthetic_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let app = app!(config_for(&server));

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/weather/forecast?location=Atlantis&days=3")
                .to_request(),
        )
        .await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["location"]["name"], "Atlantis");
        assert_eq!(body["data"]["forecast"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["forecast"][1]["maxTemp"], 23.0);
        assert_eq!(body["data"]["sources"], json!(["Fallback"]));
    }

    #[actix_web::test]
    async fn empty_search_results_use_fallback_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let app = app!(config_for(&server));

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/locations/search?q=Springfield")
                .to_request(),
        )
        .await;

        let data = &body["data"];
        assert_eq!(data["count"], 2);
        assert_eq!(data["locations"][0]["id"], "1");
        assert_eq!(data["locations"][0]["country"], "US");
        assert_eq!(data["locations"][1]["id"], "2");
        assert_eq!(data["locations"][1]["country"], "UK");
        assert_eq!(data["locations"][0]["name"], "Springfield");
        assert_eq!(data["locations"][1]["name"], "Springfield");
    }

    #[actix_web::test]
    async fn search_requires_query() {
        let server = MockServer::start().await;
        let app = app!(config_for(&server));

        let req = test::TestRequest::get()
            .uri("/locations/search?q=")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Query parameter 'q' is required");
    }

    #[actix_web::test]
    async fn eleventh_weather_request_is_rate_limited() {
        let server = MockServer::start().await;
        mount_current(
            &server,
            ResponseTemplate::new(200).set_body_json(openweather_current()),
            1,
        )
        .await;
        let app = app!(config_for(&server));

        for i in 0..10 {
            let req = test::TestRequest::get()
                .uri("/weather/current?location=London")
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "request {i}");
        }

        let req = test::TestRequest::get()
            .uri("/weather/current?location=London")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Rate limit exceeded. Maximum 10 requests per minute."
        );

        let req = test::TestRequest::get()
            .uri("/locations/search")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
