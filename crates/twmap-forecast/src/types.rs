use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast for one region in the current/next 12-hour window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Region name, the store key (e.g. "臺北市")
    pub location: String,
    /// Short weather phrase (Wx)
    pub weather_description: String,
    /// Minimum temperature in °C (MinT)
    pub min_temperature: i32,
    /// Maximum temperature in °C (MaxT)
    pub max_temperature: i32,
    /// Probability of precipitation in percent (PoP)
    pub precipitation_probability: i32,
    /// Comfort descriptor (CI), passed through unchanged
    pub comfort_index: String,
}

impl ForecastRecord {
    /// Mean of the minimum and maximum temperature.
    pub fn average_temperature(&self) -> f64 {
        (f64::from(self.min_temperature) + f64::from(self.max_temperature)) / 2.0
    }

    /// "min-max" as shown in the table view.
    pub fn temperature_range(&self) -> String {
        format!("{}-{}", self.min_temperature, self.max_temperature)
    }
}

/// A record as held by the store, stamped with its last successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredForecast {
    #[serde(flatten)]
    pub record: ForecastRecord,
    pub updated_at: DateTime<Utc>,
}

/// The two ways a fetch can go wrong, as far as the caller is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkFailure,
    MalformedResponse,
}

/// Forecast provider errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Feed reported success={0}")]
    Unsuccessful(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) | Self::Status(_) => FailureKind::NetworkFailure,
            Self::Unsuccessful(_) | Self::Malformed(_) => FailureKind::MalformedResponse,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Forecast store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored timestamp for {location} is invalid: {value}")]
    Timestamp { location: String, value: String },
}
