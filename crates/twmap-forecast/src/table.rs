//! Table view of the stored snapshot.

use serde::Serialize;

use crate::map::band;
use crate::types::ForecastRecord;

/// Column headings, in display order.
pub const COLUMNS: [&str; 4] = ["縣市", "氣溫範圍", "天氣", "降雨%"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    #[serde(rename = "縣市")]
    pub region: String,
    #[serde(rename = "氣溫範圍")]
    pub temperature_range: String,
    #[serde(rename = "天氣")]
    pub weather: String,
    #[serde(rename = "降雨%")]
    pub precipitation: i32,
    /// Highlight color, banded on the minimum temperature
    #[serde(skip)]
    pub highlight: &'static str,
}

impl From<&ForecastRecord> for TableRow {
    fn from(record: &ForecastRecord) -> Self {
        Self {
            region: record.location.clone(),
            temperature_range: record.temperature_range(),
            weather: record.weather_description.clone(),
            precipitation: record.precipitation_probability,
            highlight: band(f64::from(record.min_temperature)),
        }
    }
}

/// One row per record, in the given order.
pub fn tabulate<'a, I>(records: I) -> Vec<TableRow>
where
    I: IntoIterator<Item = &'a ForecastRecord>,
{
    records.into_iter().map(TableRow::from).collect()
}
