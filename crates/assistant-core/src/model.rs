//! Domain Models
//!
//! Market and news data as presented to the prompt assembler and the
//! HTTP layer. Uses rust_decimal for all monetary values - never use
//! f64 for money!
//!
//! Provider outages surface as sentinel values (`unavailable()`) and
//! notice items rather than errors, so a degraded analysis still renders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source label carried by sentinel snapshots
pub const SOURCE_UNAVAILABLE: &str = "Unavailable";

/// Kind label carried by notice news items
pub const KIND_NOTICE: &str = "notice";

/// 24-hour price snapshot from an exchange or aggregator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Last traded price in USD
    pub price: Decimal,

    /// 24-hour change in percent
    pub change_24h: Decimal,

    /// 24-hour traded volume
    pub volume_24h: Decimal,

    /// 24-hour high
    pub high_24h: Decimal,

    /// 24-hour low
    pub low_24h: Decimal,

    /// Which provider produced this snapshot
    pub source: String,
}

impl PriceSnapshot {
    /// Zeroed sentinel used when every price tier failed
    pub fn unavailable() -> Self {
        Self {
            price: Decimal::ZERO,
            change_24h: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: Decimal::ZERO,
            low_24h: Decimal::ZERO,
            source: SOURCE_UNAVAILABLE.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.source == SOURCE_UNAVAILABLE
    }
}

/// Broader market overview for a token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub price: Decimal,
    pub change_24h: Decimal,
    pub volume_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,

    /// Market capitalization in USD
    pub market_cap: Decimal,

    /// Market-cap rank; 0 when unranked
    pub rank: u32,

    pub circulating_supply: Decimal,
    pub total_supply: Decimal,
    pub max_supply: Decimal,

    /// 7-day change in percent
    pub change_7d: Decimal,

    /// 30-day change in percent
    pub change_30d: Decimal,

    /// All-time high
    pub ath: Decimal,

    /// All-time low
    pub atl: Decimal,

    /// Which provider produced this snapshot
    pub source: String,

    pub last_updated: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Zeroed sentinel used when the detail endpoint failed
    pub fn unavailable() -> Self {
        Self {
            price: Decimal::ZERO,
            change_24h: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: Decimal::ZERO,
            low_24h: Decimal::ZERO,
            market_cap: Decimal::ZERO,
            rank: 0,
            circulating_supply: Decimal::ZERO,
            total_supply: Decimal::ZERO,
            max_supply: Decimal::ZERO,
            change_7d: Decimal::ZERO,
            change_30d: Decimal::ZERO,
            ath: Decimal::ZERO,
            atl: Decimal::ZERO,
            source: SOURCE_UNAVAILABLE.to_string(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.source == SOURCE_UNAVAILABLE
    }
}

/// A single news headline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,

    /// Post kind as reported by the provider ("news", "media", ...)
    pub kind: String,

    pub published_at: DateTime<Utc>,
    pub votes_positive: u32,
    pub votes_negative: u32,
}

impl NewsItem {
    /// Synthetic item explaining why live headlines are missing
    pub fn notice(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: String::new(),
            source: "System Notice".to_string(),
            kind: KIND_NOTICE.to_string(),
            published_at: Utc::now(),
            votes_positive: 0,
            votes_negative: 0,
        }
    }

    pub fn is_notice(&self) -> bool {
        self.kind == KIND_NOTICE
    }
}
