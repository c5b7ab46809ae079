//! CoinGecko Client
//!
//! Fallback price tier and the market-overview source. The simple-price
//! endpoint backs `PriceSource`; the coin detail endpoint backs
//! `MarketSource`. CoinGecko omits fields freely, so every numeric
//! decodes through defaults and absent values collapse to zero.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use assistant_core::{MarketSnapshot, PriceSnapshot, TokenIdentity};

use crate::error::{DataError, Result};
use crate::market::{MarketSource, PriceSource};
use crate::retry::REQUEST_TIMEOUT;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    #[serde(default)]
    usd: Decimal,
    #[serde(default)]
    usd_24h_vol: Decimal,
    #[serde(default)]
    usd_24h_change: Decimal,
}

#[derive(Debug, Default, Deserialize)]
struct PriceMap {
    #[serde(default)]
    usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: PriceMap,
    #[serde(default)]
    market_cap: PriceMap,
    #[serde(default)]
    total_volume: PriceMap,
    #[serde(default)]
    high_24h: PriceMap,
    #[serde(default)]
    low_24h: PriceMap,
    #[serde(default)]
    ath: PriceMap,
    #[serde(default)]
    atl: PriceMap,
    #[serde(default)]
    price_change_percentage_24h: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_7d: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_30d: Option<Decimal>,
    #[serde(default)]
    circulating_supply: Option<Decimal>,
    #[serde(default)]
    total_supply: Option<Decimal>,
    #[serde(default)]
    max_supply: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CoinDetail {
    #[serde(default)]
    market_cap_rank: Option<u32>,
    market_data: Option<MarketData>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// CoinGecko REST client
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

fn from_detail(detail: CoinDetail) -> Result<MarketSnapshot> {
    let market_data = detail.market_data.ok_or_else(|| DataError::MissingField {
        provider: "CoinGecko",
        field: "market_data".to_string(),
    })?;

    Ok(MarketSnapshot {
        price: market_data.current_price.usd.unwrap_or_default(),
        change_24h: market_data.price_change_percentage_24h.unwrap_or_default(),
        volume_24h: market_data.total_volume.usd.unwrap_or_default(),
        high_24h: market_data.high_24h.usd.unwrap_or_default(),
        low_24h: market_data.low_24h.usd.unwrap_or_default(),
        market_cap: market_data.market_cap.usd.unwrap_or_default(),
        rank: detail.market_cap_rank.unwrap_or(0),
        circulating_supply: market_data.circulating_supply.unwrap_or_default(),
        total_supply: market_data.total_supply.unwrap_or_default(),
        max_supply: market_data.max_supply.unwrap_or_default(),
        change_7d: market_data.price_change_percentage_7d.unwrap_or_default(),
        change_30d: market_data.price_change_percentage_30d.unwrap_or_default(),
        ath: market_data.ath.usd.unwrap_or_default(),
        atl: market_data.atl.usd.unwrap_or_default(),
        source: "CoinGecko".to_string(),
        last_updated: detail.last_updated.unwrap_or_else(Utc::now),
    })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_price(&self, token: &TokenIdentity) -> Result<PriceSnapshot> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("ids", token.provider_id.as_str()),
                ("vs_currencies", "usd"),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Status {
                provider: "CoinGecko",
                status: status.as_u16(),
            });
        }

        let mut body: HashMap<String, SimplePriceEntry> = response.json().await?;
        let entry = body
            .remove(&token.provider_id)
            .ok_or_else(|| DataError::MissingField {
                provider: "CoinGecko",
                field: token.provider_id.clone(),
            })?;

        Ok(PriceSnapshot {
            price: entry.usd,
            change_24h: entry.usd_24h_change,
            volume_24h: entry.usd_24h_vol,
            // The simple-price endpoint carries no 24h range
            high_24h: Decimal::ZERO,
            low_24h: Decimal::ZERO,
            source: "CoinGecko".to_string(),
        })
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    async fn fetch_market(&self, token: &TokenIdentity) -> Result<MarketSnapshot> {
        let url = format!("{}/coins/{}", self.base_url, token.provider_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "true"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "false"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Status {
                provider: "CoinGecko",
                status: status.as_u16(),
            });
        }

        let detail: CoinDetail = response.json().await?;
        from_detail(detail)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
