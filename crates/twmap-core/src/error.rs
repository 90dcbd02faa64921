//! Centralized error types for the twmap dashboard.
//!
//! This module provides a typed error hierarchy that:
//! - Keeps the three failure families (network, malformed feed, storage) distinct
//! - Provides user-friendly messages suitable for the dashboard banner
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Forecast feed error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// True when stored data is known to be untouched by the failure.
    pub fn preserves_snapshot(&self) -> bool {
        !matches!(self, AppError::Database(DatabaseError::Corruption(_)))
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("TLS/SSL error: {0}")]
    TlsError(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to reach the forecast service. Check your internet connection."
            }
            NetworkError::Timeout => "The forecast request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The forecast service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { status, .. } if *status == 401 || *status == 403 => {
                "The forecast service rejected the API key. Check settings."
            }
            NetworkError::ServerError { .. } => "The forecast request failed. Please try again.",
            NetworkError::TlsError(_) => "Secure connection failed. Check your network settings.",
        }
    }
}

/// Forecast feed errors: the service answered but the payload is unusable.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Feed reported failure")]
    Unsuccessful,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::Unsuccessful => "The forecast service reported an error. Please try again.",
            ForecastError::MalformedResponse(_) => {
                "Received an unexpected forecast format. Please try again later."
            }
            ForecastError::InvalidApiKey => "Forecast API key is invalid. Check settings.",
        }
    }
}

/// Database/storage errors (SQLite forecast store).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to open the local forecast store. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => {
                "Saving the forecast failed. The previous data was kept."
            }
            DatabaseError::Corruption(_) => {
                "The local forecast store may be corrupted. Consider deleting it."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if mentions_certificate(&self) {
            NetworkError::TlsError(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

fn mentions_certificate(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().to_lowercase().contains("certificate") {
            return true;
        }
        current = e.source();
    }
    false
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Network(NetworkError::Timeout),
            AppError::Forecast(ForecastError::Unsuccessful),
            AppError::Forecast(ForecastError::MalformedResponse("x".into())),
            AppError::Database(DatabaseError::QueryFailed("test".into())),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = ForecastError::Unsuccessful.into();
        assert!(matches!(err, AppError::Forecast(ForecastError::Unsuccessful)));
    }

    #[test]
    fn test_auth_status_message() {
        let err = NetworkError::ServerError {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert!(err.user_message().contains("API key"));

        let err = NetworkError::ServerError {
            status: 503,
            message: "Unavailable".into(),
        };
        assert!(err.user_message().contains("later"));
    }

    #[test]
    fn test_corruption_does_not_preserve_snapshot() {
        assert!(AppError::Network(NetworkError::Timeout).preserves_snapshot());
        assert!(!AppError::Database(DatabaseError::Corruption("x".into())).preserves_snapshot());
    }

    #[test]
    fn test_rusqlite_error_mapping() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
