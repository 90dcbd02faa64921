//! SQLite-backed forecast snapshot store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::types::{ForecastRecord, StoreError, StoredForecast};

/// Latest forecast per region. One row per `location`.
///
/// The connection is owned by the store and closed when it is dropped.
pub struct ForecastStore {
    conn: Connection,
}

impl ForecastStore {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self { conn };
        store.ensure_schema()?;
        tracing::debug!("Opened forecast store at {}", path.as_ref().display());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the forecast table if it does not exist.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS forecast (
                location TEXT PRIMARY KEY,
                weather_description TEXT NOT NULL,
                min_temperature INTEGER NOT NULL,
                max_temperature INTEGER NOT NULL,
                precipitation_probability INTEGER NOT NULL,
                comfort_index TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Replace the stored row of every region in `records`, stamped now.
    ///
    /// The batch is committed as one transaction: on error no row changes.
    /// Regions not in `records` keep their previous snapshot.
    pub fn upsert(&mut self, records: &[ForecastRecord]) -> Result<usize, StoreError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO forecast
                (location, weather_description, min_temperature, max_temperature,
                 precipitation_probability, comfort_index, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for record in records {
                stmt.execute(params![
                    record.location,
                    record.weather_description,
                    record.min_temperature,
                    record.max_temperature,
                    record.precipitation_probability,
                    record.comfort_index,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!("Stored forecast for {} regions", records.len());
        Ok(records.len())
    }

    /// Every stored record in write order. Empty means nothing fetched yet.
    pub fn read_all(&self) -> Result<Vec<StoredForecast>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT location, weather_description, min_temperature, max_temperature,
                    precipitation_probability, comfort_index, updated_at
             FROM forecast ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let record = ForecastRecord {
                    location: row.get(0)?,
                    weather_description: row.get(1)?,
                    min_temperature: row.get(2)?,
                    max_temperature: row.get(3)?,
                    precipitation_probability: row.get(4)?,
                    comfort_index: row.get(5)?,
                };
                let updated_at: String = row.get(6)?;
                Ok((record, updated_at))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(record, updated_at)| {
                let updated_at = parse_timestamp(&record.location, &updated_at)?;
                Ok(StoredForecast { record, updated_at })
            })
            .collect()
    }

    /// Time of the most recent successful save, if any.
    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM forecast", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?
            .flatten();

        latest
            .map(|value| parse_timestamp("*", &value))
            .transpose()
    }
}

fn parse_timestamp(location: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp {
            location: location.to_string(),
            value: value.to_string(),
        })
}
