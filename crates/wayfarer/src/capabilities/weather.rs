use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::open_meteo::OpenMeteoClient;
use super::{error_payload, parse_arguments, to_payload, Capability};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

pub const HUMIDITY_NOTE: &str =
    "N/A (Open-Meteo current_weather endpoint doesn't return humidity, check forecast)";

/// Describe a WMO weather code reported for current conditions
pub fn current_conditions(code: i64) -> &'static str {
    match code {
        1..=3 => "Partly Cloudy",
        45 | 48 => "Fog",
        51 | 53 | 55 | 61 | 63 | 65 => "Rain",
        71 | 73 | 75 | 77 => "Snow",
        c if c >= 95 => "Thunderstorm",
        _ => "Clear",
    }
}

/// Describe a WMO weather code reported for a forecast day
pub fn daily_condition(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        c if c <= 3 => "Cloudy",
        c if c < 50 => "Fog",
        c if c < 80 => "Rain",
        c if c < 90 => "Showers",
        _ => "Thunderstorm/Snow",
    }
}

/// Render an upstream reading with its unit, keeping the upstream number format
fn reading(value: &Value, unit: &str) -> String {
    match value {
        Value::Null => "unknown".to_string(),
        Value::String(text) => format!("{}{}", text, unit),
        other => format!("{}{}", other, unit),
    }
}

fn celsius(value: &Value) -> String {
    reading(value, "°C")
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherArgs {
    city: String,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct CurrentWeatherReport {
    location: String,
    temperature: String,
    conditions: &'static str,
    wind_speed: String,
    humidity: &'static str,
}

pub struct CurrentWeather {
    tool: Tool,
    client: OpenMeteoClient,
}

impl CurrentWeather {
    pub fn new(client: OpenMeteoClient) -> Self {
        let tool = Tool::new(
            "get_current_weather",
            "Fetch current weather conditions for a specified city. Returns temperature, conditions, humidity, and wind speed.",
            json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to get weather for, e.g., 'London' or 'New York'."
                    },
                    "country_code": {
                        "type": "string",
                        "description": "Optional 2-letter country code to clarify the city (e.g., 'US', 'UK')."
                    }
                },
                "required": ["city"]
            }),
        );
        Self { tool, client }
    }

    pub async fn lookup(&self, city: &str, country_code: Option<&str>) -> AgentResult<String> {
        let label = match country_code {
            Some(code) => format!("{}, {}", city, code),
            None => city.to_string(),
        };

        // Geocoding matches better on the bare city name
        let Some(at) = self.client.coordinates(city).await else {
            return Ok(error_payload(format!(
                "Could not find coordinates for city: {}",
                label
            )));
        };

        match self.client.current_weather(&at).await {
            Ok(current) => to_payload(&CurrentWeatherReport {
                location: label,
                temperature: celsius(&current.temperature),
                conditions: current_conditions(current.weathercode),
                wind_speed: reading(&current.windspeed, " km/h"),
                humidity: HUMIDITY_NOTE,
            }),
            Err(e) => Ok(error_payload(format!("Failed to fetch weather data: {}", e))),
        }
    }
}

#[async_trait]
impl Capability for CurrentWeather {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<String> {
        let args: CurrentWeatherArgs = parse_arguments(arguments)?;
        self.lookup(&args.city, args.country_code.as_deref()).await
    }
}

fn default_days() -> i64 {
    3
}

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    location: String,
    #[serde(default = "default_days")]
    days: i64,
}

#[derive(Debug, Serialize)]
struct ForecastDay {
    date: String,
    high: String,
    low: String,
    condition: &'static str,
}

#[derive(Debug, Serialize)]
struct ForecastReport {
    location: String,
    forecast: Vec<ForecastDay>,
}

pub struct WeatherForecast {
    tool: Tool,
    client: OpenMeteoClient,
}

impl WeatherForecast {
    pub fn new(client: OpenMeteoClient) -> Self {
        let tool = Tool::new(
            "get_weather_forecast",
            "Get a weather forecast for a location for a specified number of days (1-5).",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city or location to get the forecast for."
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of days for the forecast. Must be between 1 and 5.",
                        "minimum": 1,
                        "maximum": 5
                    }
                },
                "required": ["location"]
            }),
        );
        Self { tool, client }
    }

    pub async fn lookup(&self, location: &str, days: i64) -> AgentResult<String> {
        if !(1..=5).contains(&days) {
            return Ok(error_payload("Days must be between 1 and 5"));
        }

        let Some(at) = self.client.coordinates(location).await else {
            return Ok(error_payload(format!(
                "Could not find coordinates for location: {}",
                location
            )));
        };

        match self.client.daily_forecast(&at, days).await {
            Ok(daily) => to_payload(&ForecastReport {
                location: location.to_string(),
                forecast: daily
                    .iter()
                    .map(|day| ForecastDay {
                        date: day.date.clone(),
                        high: celsius(&day.high),
                        low: celsius(&day.low),
                        condition: daily_condition(day.weathercode),
                    })
                    .collect(),
            }),
            Err(e) => Ok(error_payload(format!("Failed to fetch forecast: {}", e))),
        }
    }
}

#[async_trait]
impl Capability for WeatherForecast {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<String> {
        let args: ForecastArgs = parse_arguments(arguments)?;
        self.lookup(&args.location, args.days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::open_meteo::OpenMeteoConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_geocoding(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(OpenMeteoConfig::with_host(server.uri())).unwrap()
    }

    #[test]
    fn test_current_conditions_mapping() {
        assert_eq!(current_conditions(0), "Clear");
        assert_eq!(current_conditions(2), "Partly Cloudy");
        assert_eq!(current_conditions(48), "Fog");
        assert_eq!(current_conditions(63), "Rain");
        assert_eq!(current_conditions(77), "Snow");
        assert_eq!(current_conditions(96), "Thunderstorm");
        // Codes outside the listed groups fall back to Clear
        assert_eq!(current_conditions(80), "Clear");
        assert_eq!(current_conditions(57), "Clear");
    }

    #[test]
    fn test_reading_rendering() {
        assert_eq!(celsius(&json!(3)), "3°C");
        assert_eq!(celsius(&json!(-1.5)), "-1.5°C");
        assert_eq!(celsius(&json!("21.4")), "21.4°C");
        assert_eq!(celsius(&Value::Null), "unknown");
        assert_eq!(reading(&json!(10), " km/h"), "10 km/h");
    }

    #[test]
    fn test_daily_condition_mapping() {
        assert_eq!(daily_condition(0), "Clear");
        assert_eq!(daily_condition(3), "Cloudy");
        assert_eq!(daily_condition(45), "Fog");
        assert_eq!(daily_condition(61), "Rain");
        assert_eq!(daily_condition(81), "Showers");
        assert_eq!(daily_condition(95), "Thunderstorm/Snow");
    }

    #[tokio::test]
    async fn test_current_weather() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_geocoding(
            &server,
            json!({"results": [{"latitude": 10.0, "longitude": 20.0}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_weather": {"temperature": 25, "windspeed": 10, "weathercode": 0}
            })))
            .mount(&server)
            .await;

        let capability = CurrentWeather::new(client_for(&server));
        let output = capability.call(json!({"city": "Test City"})).await?;
        let data: Value = serde_json::from_str(&output)?;

        assert_eq!(data["location"], "Test City");
        assert_eq!(data["temperature"], "25°C");
        assert_eq!(data["conditions"], "Clear");
        assert_eq!(data["wind_speed"], "10 km/h");
        assert_eq!(data["humidity"], HUMIDITY_NOTE);
        Ok(())
    }

    #[tokio::test]
    async fn test_current_weather_unknown_city_uses_label() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_geocoding(&server, json!({})).await;

        let capability = CurrentWeather::new(client_for(&server));
        let output = capability
            .call(json!({"city": "Narnia", "country_code": "ME"}))
            .await?;

        assert_eq!(
            output,
            r#"{"error":"Could not find coordinates for city: Narnia, ME"}"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_current_weather_fetch_failure() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_geocoding(
            &server,
            json!({"results": [{"latitude": 10.0, "longitude": 20.0}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let capability = CurrentWeather::new(client_for(&server));
        let output = capability.call(json!({"city": "Oslo"})).await?;
        let data: Value = serde_json::from_str(&output)?;

        let error = data["error"].as_str().unwrap();
        assert!(error.starts_with("Failed to fetch weather data: "));
        Ok(())
    }

    #[tokio::test]
    async fn test_forecast_days_out_of_range() -> anyhow::Result<()> {
        // No server: validation happens before any request
        let client = OpenMeteoClient::new(OpenMeteoConfig::with_host("http://127.0.0.1:9"))?;
        let capability = WeatherForecast::new(client);

        for days in [0, 6, -1] {
            let output = capability
                .call(json!({"location": "Oslo", "days": days}))
                .await?;
            assert_eq!(output, r#"{"error":"Days must be between 1 and 5"}"#);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_forecast_entries() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_geocoding(
            &server,
            json!({"results": [{"latitude": 48.85, "longitude": 2.35}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_days", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "daily": {
                    "time": ["2024-06-01", "2024-06-02"],
                    "temperature_2m_max": [21.4, 19],
                    "temperature_2m_min": [12.0, 10.2],
                    "weathercode": [0, 61]
                }
            })))
            .mount(&server)
            .await;

        let capability = WeatherForecast::new(client_for(&server));
        let output = capability.call(json!({"location": "Paris"})).await?;
        let data: Value = serde_json::from_str(&output)?;

        assert_eq!(data["location"], "Paris");
        let forecast = data["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast[0]["date"], "2024-06-01");
        assert_eq!(forecast[0]["high"], "21.4°C");
        assert_eq!(forecast[0]["low"], "12.0°C");
        assert_eq!(forecast[0]["condition"], "Clear");
        assert_eq!(forecast[1]["high"], "19°C");
        assert_eq!(forecast[1]["condition"], "Rain");
        Ok(())
    }

    #[tokio::test]
    async fn test_forecast_unknown_location() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_geocoding(&server, json!({"results": []})).await;

        let capability = WeatherForecast::new(client_for(&server));
        let output = capability
            .call(json!({"location": "Atlantis", "days": 2}))
            .await?;
        assert_eq!(
            output,
            r#"{"error":"Could not find coordinates for location: Atlantis"}"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let client = OpenMeteoClient::new(OpenMeteoConfig::default()).unwrap();
        let capability = CurrentWeather::new(client);
        assert!(capability.call(json!({"country_code": "US"})).await.is_err());
    }
}
