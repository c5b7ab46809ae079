//! Error Types

use thiserror::Error;

/// Result type alias for data-provider operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors from market-data and news providers
#[derive(Error, Debug)]
pub enum DataError {
    /// Provider answered with a non-success HTTP status
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    /// Provider response was missing an expected field
    #[error("{provider} response missing field: {field}")]
    MissingField { provider: &'static str, field: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not parse
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    /// Whether a retry against the same provider could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(err) => !err.is_decode(),
            DataError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let rate_limited = DataError::Status {
            provider: "Binance",
            status: 429,
        };
        let server_error = DataError::Status {
            provider: "Binance",
            status: 503,
        };
        let not_found = DataError::Status {
            provider: "CoinGecko",
            status: 404,
        };

        assert!(rate_limited.is_retryable());
        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_missing_field_is_not_retryable() {
        let missing = DataError::MissingField {
            provider: "CoinGecko",
            field: "market_data".to_string(),
        };
        assert!(!missing.is_retryable());
        assert_eq!(
            missing.to_string(),
            "CoinGecko response missing field: market_data"
        );
    }
}
