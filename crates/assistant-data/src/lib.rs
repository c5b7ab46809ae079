//! # assistant-data
//!
//! Market data and news clients for the crypto analysis assistant.
//!
//! Public fetch methods never fail: provider outages degrade to zeroed
//! sentinel snapshots and synthetic notice headlines, so a partial
//! analysis always beats no analysis. Each provider call gets a bounded
//! timeout and a linear-backoff retry loop, and successful responses
//! are memoized in small TTL caches.

pub mod cache;
pub mod error;
pub mod market;
pub mod news;
pub mod retry;

pub use cache::{TtlCache, DEFAULT_TTL};
pub use error::{DataError, Result};
pub use market::{
    BinanceSource, CoinGeckoClient, MarketDataClient, MarketSource, PriceSource,
};
pub use news::{CryptoPanicApi, NewsClient, PostsApi, RawPost, DEFAULT_NEWS_LIMIT};
pub use retry::RetryPolicy;
