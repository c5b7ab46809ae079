//! Analysis Pipeline
//!
//! Orchestrates one query end to end: resolve the token, fan out to the
//! market and news clients, assemble the prompt, and generate the
//! summary. The only error it can return is an unresolved token;
//! provider outages arrive as sentinels, notices, or diagnostic text.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use assistant_core::{
    build_prompt, AnalysisRequest, AssistantError, Depth, GenerationProvider, Language,
    MarketSnapshot, NewsItem, PriceSnapshot, Result, TokenIdentity, TokenRegistry,
};
use assistant_data::{MarketDataClient, NewsClient, DEFAULT_NEWS_LIMIT};

/// Per-request knobs accepted by the analyze endpoint
#[derive(Clone, Debug, Default)]
pub struct AnalysisOptions {
    pub language: Language,
    pub depth: Depth,
    pub model: Option<String>,
    pub news_limit: Option<usize>,
}

/// One completed analysis
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    pub token: TokenIdentity,
    pub price: PriceSnapshot,
    pub market: MarketSnapshot,
    pub news: Vec<NewsItem>,
    pub summary: String,
    pub model: String,
    pub elapsed_ms: u64,
}

pub struct AnalysisPipeline {
    registry: Arc<RwLock<TokenRegistry>>,
    market: Arc<MarketDataClient>,
    news: Arc<NewsClient>,
    provider: Arc<dyn GenerationProvider>,
    default_model: String,
}

impl AnalysisPipeline {
    pub fn new(
        registry: Arc<RwLock<TokenRegistry>>,
        market: Arc<MarketDataClient>,
        news: Arc<NewsClient>,
        provider: Arc<dyn GenerationProvider>,
        default_model: String,
    ) -> Self {
        Self {
            registry,
            market,
            news,
            provider,
            default_model,
        }
    }

    pub async fn analyze(&self, query: &str, options: AnalysisOptions) -> Result<AnalysisReport> {
        let started = Instant::now();

        let token = {
            let registry = self.registry.read().await;
            registry
                .resolve(query)
                .ok_or_else(|| AssistantError::UnknownToken {
                    query: query.to_string(),
                    suggestions: registry.suggest(query, 5),
                })?
        };
        tracing::info!(query, token = %token.symbol, "resolved token");

        let limit = options.news_limit.unwrap_or(DEFAULT_NEWS_LIMIT);

        // All three fetches run to completion; failures arrive as
        // sentinels or notice items, never as errors.
        let (price, market, news) = tokio::join!(
            self.market.fetch_price(&token),
            self.market.fetch_market(&token),
            self.news.fetch_news(&token, limit),
        );

        let model = options.model.unwrap_or_else(|| self.default_model.clone());
        let request = AnalysisRequest {
            token,
            price,
            market,
            news,
            language: options.language,
            depth: options.depth,
            model,
        };

        let prompt = build_prompt(&request);
        let summary = self
            .provider
            .generate(&prompt, &request.model, request.language)
            .await;

        let AnalysisRequest {
            token,
            price,
            market,
            news,
            model,
            ..
        } = request;

        Ok(AnalysisReport {
            token,
            price,
            market,
            news,
            summary,
            model,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    use assistant_data::{
        MarketSource, PostsApi, PriceSource, RawPost, Result as DataResult, RetryPolicy,
    };

    struct StaticPrice;

    #[async_trait]
    impl PriceSource for StaticPrice {
        async fn fetch_price(&self, _token: &TokenIdentity) -> DataResult<PriceSnapshot> {
            Ok(PriceSnapshot {
                price: dec!(3450),
                change_24h: dec!(2.5),
                volume_24h: dec!(25000000000),
                high_24h: dec!(3500),
                low_24h: dec!(3400),
                source: "Binance".to_string(),
            })
        }

        fn name(&self) -> &str {
            "Binance"
        }
    }

    struct FailingPrice;

    #[async_trait]
    impl PriceSource for FailingPrice {
        async fn fetch_price(&self, _token: &TokenIdentity) -> DataResult<PriceSnapshot> {
            Err(assistant_data::DataError::Status {
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
        async fn fetch_market(&self, _token: &TokenIdentity) -> DataResult<MarketSnapshot> {
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
        async fn fetch_market(&self, _token: &TokenIdentity) -> DataResult<MarketSnapshot> {
            Err(assistant_data::DataError::Status {
                provider: "CoinGecko",
                status: 500,
            })
        }

        fn name(&self) -> &str {
            "CoinGecko"
        }
    }

    struct StaticNews {
        fail: bool,
    }

    #[async_trait]
    impl PostsApi for StaticNews {
        async fn fetch_posts(
            &self,
            _currencies: Option<&str>,
            _public_only: bool,
        ) -> DataResult<Vec<RawPost>> {
            if self.fail {
                return Err(assistant_data::DataError::Status {
                    provider: "CryptoPanic",
                    status: 502,
                });
            }
            Ok(vec![RawPost {
                title: "Ethereum upgrade ships".to_string(),
                ..RawPost::default()
            }])
        }

        fn has_key(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "Fake"
        }
    }

    #[derive(Default)]
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationProvider for RecordingProvider {
        async fn generate(&self, prompt: &str, _model: &str, _language: Language) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            "Generated analysis.".to_string()
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn list_models(&self) -> Vec<String> {
            vec!["llama2".to_string()]
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    fn pipeline(
        price: Arc<dyn PriceSource>,
        detail: Arc<dyn MarketSource>,
        news_fails: bool,
        provider: Arc<RecordingProvider>,
    ) -> AnalysisPipeline {
        let registry = Arc::new(RwLock::new(TokenRegistry::with_defaults()));
        let market = Arc::new(
            MarketDataClient::with_sources(vec![price], detail)
                .with_retry(RetryPolicy::none()),
        );
        let news = Arc::new(NewsClient::new(Arc::new(StaticNews { fail: news_fails })));
        AnalysisPipeline::new(registry, market, news, provider, "llama2".to_string())
    }

    #[tokio::test]
    async fn test_full_pipeline_for_ethereum_query() {
        let provider = Arc::new(RecordingProvider::default());
        let pipeline = pipeline(
            Arc::new(StaticPrice),
            Arc::new(StaticMarket),
            false,
            provider.clone(),
        );

        let report = pipeline
            .analyze(
                "Tell me about Ethereum",
                AnalysisOptions {
                    language: Language::English,
                    ..AnalysisOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.token.name, "Ethereum");
        assert_eq!(report.token.symbol, "ETH");
        assert_eq!(report.token.provider_id, "ethereum");
        assert_eq!(report.price.source, "Binance");
        assert_eq!(report.market.rank, 2);
        assert_eq!(report.news.len(), 1);
        assert_eq!(report.summary, "Generated analysis.");
        assert_eq!(report.model, "llama2");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Ethereum (ETH)"));
        assert!(prompts[0].contains("Ethereum upgrade ships"));
    }

    #[tokio::test]
    async fn test_unknown_token_yields_suggestions() {
        let provider = Arc::new(RecordingProvider::default());
        let pipeline = pipeline(
            Arc::new(StaticPrice),
            Arc::new(StaticMarket),
            false,
            provider.clone(),
        );

        let result = pipeline
            .analyze("tell me about splorkium", AnalysisOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(AssistantError::UnknownToken { .. })
        ));
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sentinels_flow_through_to_the_prompt() {
        let provider = Arc::new(RecordingProvider::default());
        let pipeline = pipeline(
            Arc::new(FailingPrice),
            Arc::new(FailingMarket),
            true,
            provider.clone(),
        );

        let report = pipeline
            .analyze(
                "bitcoin price",
                AnalysisOptions {
                    language: Language::English,
                    ..AnalysisOptions::default()
                },
            )
            .await
            .unwrap();

        assert!(report.price.is_unavailable());
        assert!(report.market.is_unavailable());
        assert!(report.news[0].is_notice());
        assert_eq!(report.summary, "Generated analysis.");

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("$0.00"));
        assert!(prompts[0].contains("currently unavailable"));
    }

    #[tokio::test]
    async fn test_model_override_reaches_the_report() {
        let provider = Arc::new(RecordingProvider::default());
        let pipeline = pipeline(
            Arc::new(StaticPrice),
            Arc::new(StaticMarket),
            false,
            provider,
        );

        let report = pipeline
            .analyze(
                "ETH",
                AnalysisOptions {
                    model: Some("mistral".to_string()),
                    ..AnalysisOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.model, "mistral");
    }
}
