//! Maps forecast errors to twmap_core::AppError for consistent user-facing messages.

use twmap_core::{
    AppError, DatabaseError, ForecastError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
};

use crate::types::{FetchError, StoreError};

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Network(err) => AppError::Network(err.into_network_error()),
            FetchError::Status(401) | FetchError::Status(403) => {
                AppError::Forecast(ForecastError::InvalidApiKey)
            }
            FetchError::Status(status) => AppError::Network(NetworkError::ServerError {
                status,
                message: format!("forecast feed returned HTTP {}", status),
            }),
            FetchError::Unsuccessful(_) => AppError::Forecast(ForecastError::Unsuccessful),
            FetchError::Malformed(msg) => AppError::Forecast(ForecastError::MalformedResponse(msg)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Sqlite(err) => AppError::Database(err.into_database_error()),
            StoreError::Timestamp { .. } => AppError::Database(DatabaseError::Corruption(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_keep_their_family() {
        let err: AppError = FetchError::Unsuccessful("false".into()).into();
        assert!(matches!(err, AppError::Forecast(ForecastError::Unsuccessful)));

        let err: AppError = FetchError::Malformed("no records".into()).into();
        assert!(matches!(err, AppError::Forecast(ForecastError::MalformedResponse(_))));

        let err: AppError = FetchError::Status(502).into();
        assert!(matches!(
            err,
            AppError::Network(NetworkError::ServerError { status: 502, .. })
        ));
    }

    #[test]
    fn rejected_key_maps_to_invalid_api_key() {
        let err: AppError = FetchError::Status(401).into();
        assert!(matches!(err, AppError::Forecast(ForecastError::InvalidApiKey)));
    }

    #[test]
    fn store_errors_map_to_database() {
        let err: AppError = StoreError::Sqlite(rusqlite::Error::InvalidQuery).into();
        assert!(matches!(err, AppError::Database(DatabaseError::QueryFailed(_))));

        let err: AppError = StoreError::Timestamp {
            location: "臺北市".into(),
            value: "yesterday".into(),
        }
        .into();
        assert!(matches!(err, AppError::Database(DatabaseError::Corruption(_))));
    }
}
