//! Binance Price Source
//!
//! Primary price tier. Queries the public 24hr ticker for the token's
//! USDT pair; Binance serializes numbers as strings, so every numeric
//! field decodes through the decimal string codec.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use assistant_core::{PriceSnapshot, TokenIdentity};

use crate::error::{DataError, Result};
use crate::market::PriceSource;
use crate::retry::REQUEST_TIMEOUT;

const DEFAULT_BASE_URL: &str = "https://api.binance.com/api/v3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    #[serde(with = "rust_decimal::serde::str")]
    last_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    price_change_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    volume: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    high_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    low_price: Decimal,
}

/// Binance 24hr ticker client
pub struct BinanceSource {
    http: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL; tests point this at an
    /// unreachable port.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn pair(token: &TokenIdentity) -> String {
        format!("{}USDT", token.symbol.to_uppercase())
    }
}

impl Default for BinanceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    async fn fetch_price(&self, token: &TokenIdentity) -> Result<PriceSnapshot> {
        let url = format!("{}/ticker/24hr", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbol", Self::pair(token))])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Status {
                provider: "Binance",
                status: status.as_u16(),
            });
        }

        let ticker: Ticker24h = response.json().await?;
        Ok(PriceSnapshot {
            price: ticker.last_price,
            change_24h: ticker.price_change_percent,
            volume_24h: ticker.volume,
            high_24h: ticker.high_price,
            low_24h: ticker.low_price,
            source: "Binance".to_string(),
        })
    }

    fn name(&self) -> &str {
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_is_usdt_quoted() {
        let token = TokenIdentity::new("Ethereum", "eth", "ethereum");
        assert_eq!(BinanceSource::pair(&token), "ETHUSDT");
    }

    #[test]
    fn test_ticker_decodes_string_numbers() {
        let body = r#"{
            "symbol": "ETHUSDT",
            "lastPrice": "3450.00",
            "priceChangePercent": "-2.150",
            "volume": "125000.5",
            "highPrice": "3520.10",
            "lowPrice": "3390.00"
        }"#;

        let ticker: Ticker24h = serde_json::from_str(body).unwrap();
        assert_eq!(ticker.last_price, dec!(3450.00));
        assert_eq!(ticker.price_change_percent, dec!(-2.150));
        assert_eq!(ticker.volume, dec!(125000.5));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let source = BinanceSource::with_base_url("http://127.0.0.1:1");
        let token = TokenIdentity::new("Bitcoin", "BTC", "bitcoin");

        let result = source.fetch_price(&token).await;
        assert!(matches!(result, Err(DataError::Network(_))));
    }
}
