//! Market Data Client
//!
//! Tiered price fetching with retry, memoization, and sentinel
//! degradation. Sources are tried in registration order; the first
//! success wins and is cached. When every tier fails the client returns
//! a zeroed sentinel so the analysis can still render.

mod binance;
mod coingecko;

pub use binance::BinanceSource;
pub use coingecko::CoinGeckoClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use assistant_core::{MarketSnapshot, PriceSnapshot, TokenIdentity};

use crate::cache::TtlCache;
use crate::error::Result;
use crate::retry::RetryPolicy;

/// Price source trait (Strategy pattern)
///
/// Implement this for each price provider: Binance, CoinGecko, a test
/// double, etc.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the 24-hour price snapshot for a token
    async fn fetch_price(&self, token: &TokenIdentity) -> Result<PriceSnapshot>;

    /// Source name for logging and snapshot attribution
    fn name(&self) -> &str;
}

/// Market overview source trait (Strategy pattern)
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch the broader market overview for a token
    async fn fetch_market(&self, token: &TokenIdentity) -> Result<MarketSnapshot>;

    fn name(&self) -> &str;
}

/// Facade over the price tiers and the market-overview source
///
/// Public fetch methods are infallible: provider failures degrade to
/// sentinel snapshots once every tier and retry is exhausted.
pub struct MarketDataClient {
    sources: Vec<Arc<dyn PriceSource>>,
    detail: Arc<dyn MarketSource>,
    retry: RetryPolicy,
    price_cache: TtlCache<String, PriceSnapshot>,
    market_cache: TtlCache<String, MarketSnapshot>,
}

impl MarketDataClient {
    /// Client with the production tier order: Binance, then CoinGecko
    pub fn new() -> Self {
        let coingecko = Arc::new(CoinGeckoClient::new());
        let sources: Vec<Arc<dyn PriceSource>> =
            vec![Arc::new(BinanceSource::new()), coingecko.clone()];
        Self::with_sources(sources, coingecko)
    }

    /// Client over explicit sources; used by tests and custom deployments
    pub fn with_sources(
        sources: Vec<Arc<dyn PriceSource>>,
        detail: Arc<dyn MarketSource>,
    ) -> Self {
        Self {
            sources,
            detail,
            retry: RetryPolicy::default(),
            price_cache: TtlCache::default(),
            market_cache: TtlCache::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.price_cache = TtlCache::new(ttl);
        self.market_cache = TtlCache::new(ttl);
        self
    }

    /// Fetch a price snapshot, trying each tier in order.
    ///
    /// Only live snapshots are cached; a sentinel result is recomputed
    /// on the next call so recovery is picked up immediately.
    pub async fn fetch_price(&self, token: &TokenIdentity) -> PriceSnapshot {
        let key = token.symbol.clone();
        if let Some(snapshot) = self.price_cache.get(&key).await {
            tracing::debug!(symbol = %token.symbol, "price cache hit");
            return snapshot;
        }

        for source in &self.sources {
            match self
                .retry
                .run(source.name(), || source.fetch_price(token))
                .await
            {
                Ok(snapshot) => {
                    self.price_cache.insert(key, snapshot.clone()).await;
                    return snapshot;
                }
                Err(error) => {
                    tracing::warn!(
                        source = source.name(),
                        symbol = %token.symbol,
                        %error,
                        "price tier failed"
                    );
                }
            }
        }

        tracing::warn!(symbol = %token.symbol, "all price tiers failed, returning sentinel");
        PriceSnapshot::unavailable()
    }

    /// Fetch the market overview, degrading to a sentinel on failure
    pub async fn fetch_market(&self, token: &TokenIdentity) -> MarketSnapshot {
        let key = token.provider_id.clone();
        if let Some(snapshot) = self.market_cache.get(&key).await {
            tracing::debug!(provider_id = %token.provider_id, "market cache hit");
            return snapshot;
        }

        match self
            .retry
            .run(self.detail.name(), || self.detail.fetch_market(token))
            .await
        {
            Ok(snapshot) => {
                self.market_cache.insert(key, snapshot.clone()).await;
                snapshot
            }
            Err(error) => {
                tracing::warn!(
                    source = self.detail.name(),
                    provider_id = %token.provider_id,
                    %error,
                    "market overview failed, returning sentinel"
                );
                MarketSnapshot::unavailable()
            }
        }
    }
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn token() -> TokenIdentity {
        TokenIdentity::new("Ethereum", "ETH", "ethereum")
    }

    struct StaticSource {
        name: &'static str,
        price: PriceSnapshot,
        calls: AtomicU32,
    }

    impl StaticSource {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                price: PriceSnapshot {
                    price: dec!(3450),
                    change_24h: dec!(1.5),
                    volume_24h: dec!(1000000),
                    high_24h: dec!(3500),
                    low_24h: dec!(3400),
                    source: name.to_string(),
                },
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn fetch_price(&self, _token: &TokenIdentity) -> Result<PriceSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.price.clone())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct FailingSource {
        calls: AtomicU32,
    }

    impl FailingSource {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceSource for FailingSource {
        async fn fetch_price(&self, _token: &TokenIdentity) -> Result<PriceSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DataError::Status {
                provider: "Binance",
                status: 503,
            })
        }

        fn name(&self) -> &str {
            "Binance"
        }
    }

    struct StaticMarket;

    #[async_trait]
    impl MarketSource for StaticMarket {
        async fn fetch_market(&self, _token: &TokenIdentity) -> Result<MarketSnapshot> {
            let mut snapshot = MarketSnapshot::unavailable();
            snapshot.price = dec!(3450);
            snapshot.rank = 2;
            snapshot.source = "CoinGecko".to_string();
            Ok(snapshot)
        }

        fn name(&self) -> &str {
            "CoinGecko"
        }
    }

    struct FailingMarket;

    #[async_trait]
    impl MarketSource for FailingMarket {
        async fn fetch_market(&self, _token: &TokenIdentity) -> Result<MarketSnapshot> {
            Err(DataError::Status {
                provider: "CoinGecko",
                status: 500,
            })
        }

        fn name(&self) -> &str {
            "CoinGecko"
        }
    }

    #[tokio::test]
    async fn test_secondary_tier_covers_primary_failure() {
        let secondary = Arc::new(StaticSource::new("CoinGecko"));
        let client = MarketDataClient::with_sources(
            vec![Arc::new(FailingSource::new()), secondary.clone()],
            Arc::new(StaticMarket),
        )
        .with_retry(RetryPolicy::none());

        let snapshot = client.fetch_price(&token()).await;
        assert_eq!(snapshot.source, "CoinGecko");
        assert_eq!(snapshot.price, dec!(3450));
    }

    #[tokio::test]
    async fn test_all_tiers_failed_yields_sentinel() {
        let client = MarketDataClient::with_sources(
            vec![
                Arc::new(FailingSource::new()),
                Arc::new(FailingSource::new()),
            ],
            Arc::new(StaticMarket),
        )
        .with_retry(RetryPolicy::none());

        let snapshot = client.fetch_price(&token()).await;
        assert!(snapshot.is_unavailable());
    }

    #[tokio::test]
    async fn test_price_is_memoized() {
        let source = Arc::new(StaticSource::new("Binance"));
        let client = MarketDataClient::with_sources(
            vec![source.clone()],
            Arc::new(StaticMarket),
        )
        .with_retry(RetryPolicy::none());

        let first = client.fetch_price(&token()).await;
        let second = client.fetch_price(&token()).await;

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sentinel_is_not_cached() {
        let source = Arc::new(FailingSource::new());
        let client = MarketDataClient::with_sources(
            vec![source.clone()],
            Arc::new(StaticMarket),
        )
        .with_retry(RetryPolicy::none());

        assert!(client.fetch_price(&token()).await.is_unavailable());
        assert!(client.fetch_price(&token()).await.is_unavailable());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_market_overview_degrades_to_sentinel() {
        let client = MarketDataClient::with_sources(
            vec![Arc::new(StaticSource::new("Binance"))],
            Arc::new(FailingMarket),
        )
        .with_retry(RetryPolicy::none());

        let snapshot = client.fetch_market(&token()).await;
        assert!(snapshot.is_unavailable());

        let live = MarketDataClient::with_sources(
            vec![Arc::new(StaticSource::new("Binance"))],
            Arc::new(StaticMarket),
        )
        .with_retry(RetryPolicy::none());

        let snapshot = live.fetch_market(&token()).await;
        assert_eq!(snapshot.rank, 2);
        assert_eq!(snapshot.source, "CoinGecko");
    }
}
