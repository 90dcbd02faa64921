//! CWA open data client for the 36-hour county/city forecast (F-C0032-001).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use twmap_core::ForecastConfig;

use crate::types::{FetchError, ForecastRecord};

const DATASET_PATH: &str = "/api/v1/rest/datastore/F-C0032-001";
const USER_AGENT: &str = "twmap/0.1.0";

const ELEMENT_WEATHER: &str = "Wx";
const ELEMENT_PRECIPITATION: &str = "PoP";
const ELEMENT_MIN_TEMPERATURE: &str = "MinT";
const ELEMENT_MAX_TEMPERATURE: &str = "MaxT";
const ELEMENT_COMFORT: &str = "CI";

#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    success: SuccessFlag,
    records: Option<DatastoreRecords>,
}

/// CWA sends `"true"` as a string; accept a real boolean too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuccessFlag {
    Text(String),
    Flag(bool),
}

impl SuccessFlag {
    fn is_success(&self) -> bool {
        match self {
            Self::Text(s) => s.eq_ignore_ascii_case("true"),
            Self::Flag(b) => *b,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatastoreRecords {
    location: Vec<ApiLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    location_name: String,
    weather_element: Vec<WeatherElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherElement {
    element_name: String,
    time: Vec<TimeSlot>,
}

#[derive(Debug, Deserialize)]
struct TimeSlot {
    parameter: Parameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Parameter {
    parameter_name: String,
}

impl ApiLocation {
    /// First time slot of the named element.
    fn first_value(&self, element: &str) -> Result<&str, FetchError> {
        let series = self
            .weather_element
            .iter()
            .find(|e| e.element_name == element)
            .ok_or_else(|| {
                FetchError::malformed(format!(
                    "{}: missing weather element {}",
                    self.location_name, element
                ))
            })?;

        series
            .time
            .first()
            .map(|slot| slot.parameter.parameter_name.as_str())
            .ok_or_else(|| {
                FetchError::malformed(format!(
                    "{}: weather element {} has no time slots",
                    self.location_name, element
                ))
            })
    }

    fn first_integer(&self, element: &str) -> Result<i32, FetchError> {
        let raw = self.first_value(element)?;
        raw.trim().parse::<i32>().map_err(|_| {
            FetchError::malformed(format!(
                "{}: {} value {:?} is not an integer",
                self.location_name, element, raw
            ))
        })
    }

    fn into_record(self) -> Result<ForecastRecord, FetchError> {
        let weather_description = self.first_value(ELEMENT_WEATHER)?.to_string();
        let precipitation_probability = self.first_integer(ELEMENT_PRECIPITATION)?;
        let min_temperature = self.first_integer(ELEMENT_MIN_TEMPERATURE)?;
        let max_temperature = self.first_integer(ELEMENT_MAX_TEMPERATURE)?;
        let comfort_index = self.first_value(ELEMENT_COMFORT)?.to_string();

        Ok(ForecastRecord {
            location: self.location_name,
            weather_description,
            min_temperature,
            max_temperature,
            precipitation_probability,
            comfort_index,
        })
    }
}

/// Turn a raw datastore body into records. All-or-nothing.
fn parse_datastore(body: &str) -> Result<Vec<ForecastRecord>, FetchError> {
    let response: DatastoreResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(format!("JSON parse error: {}", e)))?;

    if !response.success.is_success() {
        return Err(FetchError::Unsuccessful(response.success.describe()));
    }

    let records = response
        .records
        .ok_or_else(|| FetchError::malformed("response has no records"))?;

    if records.location.is_empty() {
        return Err(FetchError::malformed("response lists no locations"));
    }

    records
        .location
        .into_iter()
        .map(ApiLocation::into_record)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ForecastProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl ForecastProvider {
    pub fn new(config: &ForecastConfig) -> Result<Self, FetchError> {
        if config.accept_invalid_certs {
            tracing::warn!(
                "TLS certificate verification disabled for forecast feed at {}",
                config.base_url
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch the current forecast window for every region the feed reports.
    ///
    /// One request, no retry. Any failure discards the whole response.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self) -> Result<Vec<ForecastRecord>, FetchError> {
        let url = format!("{}{}", self.base_url, DATASET_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[("Authorization", self.api_key.as_str()), ("format", "JSON")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast feed returned status {}", status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let records = parse_datastore(&body)?;

        tracing::info!("Fetched forecast for {} regions", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::FailureKind;
    use serde_json::json;

    fn element(name: &str, value: &str) -> serde_json::Value {
        json!({
            "elementName": name,
            "time": [
                {
                    "startTime": "2026-10-18 18:00:00",
                    "endTime": "2026-10-19 06:00:00",
                    "parameter": { "parameterName": value }
                },
                {
                    "startTime": "2026-10-19 06:00:00",
                    "endTime": "2026-10-19 18:00:00",
                    "parameter": { "parameterName": "999" }
                }
            ]
        })
    }

    fn location(name: &str, elements: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "locationName": name, "weatherElement": elements })
    }

    fn body(success: serde_json::Value, locations: Vec<serde_json::Value>) -> String {
        json!({
            "success": success,
            "records": {
                "datasetDescription": "三十六小時天氣預報",
                "location": locations
            }
        })
        .to_string()
    }

    fn taipei_elements() -> Vec<serde_json::Value> {
        vec![
            element("Wx", "多雲"),
            element("PoP", "20"),
            element("MinT", "18"),
            element("CI", "舒適"),
            element("MaxT", "24"),
        ]
    }

    #[test]
    fn test_parse_reads_first_window() {
        let records = parse_datastore(&body(json!("true"), vec![location("臺北市", taipei_elements())]))
            .unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.location, "臺北市");
        assert_eq!(r.weather_description, "多雲");
        assert_eq!(r.min_temperature, 18);
        assert_eq!(r.max_temperature, 24);
        assert_eq!(r.precipitation_probability, 20);
        assert_eq!(r.comfort_index, "舒適");
    }

    #[test]
    fn test_parse_finds_elements_by_name_not_position() {
        let mut shuffled = taipei_elements();
        shuffled.reverse();
        let records =
            parse_datastore(&body(json!("true"), vec![location("臺北市", shuffled)])).unwrap();
        assert_eq!(records[0].min_temperature, 18);
        assert_eq!(records[0].max_temperature, 24);
    }

    #[test]
    fn test_parse_accepts_boolean_success() {
        let records =
            parse_datastore(&body(json!(true), vec![location("臺北市", taipei_elements())]))
                .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_unsuccessful_flag() {
        let err = parse_datastore(&body(json!("false"), vec![])).unwrap_err();
        assert!(matches!(err, FetchError::Unsuccessful(ref s) if s == "false"));
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_missing_element_is_malformed() {
        let mut elements = taipei_elements();
        elements.retain(|e| e["elementName"] != "MaxT");
        let err =
            parse_datastore(&body(json!("true"), vec![location("臺北市", elements)])).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("MaxT")));
    }

    #[test]
    fn test_empty_time_series_is_malformed() {
        let mut elements = taipei_elements();
        elements[0] = json!({ "elementName": "Wx", "time": [] });
        let err =
            parse_datastore(&body(json!("true"), vec![location("臺北市", elements)])).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("no time slots")));
    }

    #[test]
    fn test_non_numeric_temperature_fails_whole_fetch() {
        let mut bad = taipei_elements();
        bad[2] = element("MinT", "N/A");
        let err = parse_datastore(&body(
            json!("true"),
            vec![
                location("臺北市", taipei_elements()),
                location("新北市", bad),
            ],
        ))
        .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("新北市")));
    }

    #[test]
    fn test_missing_records_and_bad_json() {
        let err = parse_datastore(r#"{"success":"true"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));

        let err = parse_datastore("<html>gateway error</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("JSON")));
    }

    #[test]
    fn test_empty_location_list_is_malformed() {
        let err = parse_datastore(&body(json!("true"), vec![])).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_provider_trims_base_url() {
        let config = ForecastConfig {
            api_key: "KEY".into(),
            base_url: "https://example.test/".into(),
            accept_invalid_certs: false,
            timeout_secs: 5,
        };
        let provider = ForecastProvider::new(&config).unwrap();
        assert_eq!(provider.base_url, "https://example.test");
    }
}
