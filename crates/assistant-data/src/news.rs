//! News Client
//!
//! CryptoPanic headlines with a four-step query ladder: name-filtered
//! public posts, name-filtered all posts, symbol-filtered public posts,
//! then the unfiltered public feed matched by title. Strategies needing
//! an API key are skipped when none is configured. When the ladder is
//! exhausted the client returns synthetic notice items, never an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use assistant_core::{NewsItem, TokenIdentity};

use crate::cache::TtlCache;
use crate::error::{DataError, Result};
use crate::retry::REQUEST_TIMEOUT;

const DEFAULT_BASE_URL: &str = "https://cryptopanic.com/api/v1";

/// Headlines fetched per token when the caller does not override it
pub const DEFAULT_NEWS_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct RawVotes {
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub negative: u32,
}

/// A post as CryptoPanic reports it, before normalization
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub votes: Option<RawVotes>,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<RawPost>,
}

/// Posts feed trait (Strategy pattern)
///
/// Implement this for each news provider or test double.
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// Fetch posts, optionally filtered to a currency and to public posts
    async fn fetch_posts(
        &self,
        currencies: Option<&str>,
        public_only: bool,
    ) -> Result<Vec<RawPost>>;

    /// Whether an API key is configured
    fn has_key(&self) -> bool;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// CryptoPanic REST client
pub struct CryptoPanicApi {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CryptoPanicApi {
    /// Key comes from CRYPTOPANIC_API_KEY, falling back to API_KEY;
    /// blank values count as unset.
    pub fn from_env() -> Self {
        let api_key = std::env::var("CRYPTOPANIC_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::new(DEFAULT_BASE_URL, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PostsApi for CryptoPanicApi {
    async fn fetch_posts(
        &self,
        currencies: Option<&str>,
        public_only: bool,
    ) -> Result<Vec<RawPost>> {
        let url = format!("{}/posts/", self.base_url);
        let mut request = self.http.get(&url).timeout(REQUEST_TIMEOUT);
        if let Some(key) = &self.api_key {
            request = request.query(&[("auth_token", key.as_str())]);
        }
        if let Some(currencies) = currencies {
            request = request.query(&[("currencies", currencies)]);
        }
        if public_only {
            request = request.query(&[("public", "true")]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Status {
                provider: "CryptoPanic",
                status: status.as_u16(),
            });
        }

        let body: PostsResponse = response.json().await?;
        Ok(body.results)
    }

    fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &str {
        "CryptoPanic"
    }
}

#[derive(Clone, Copy)]
enum Filter {
    Name,
    Symbol,
    None,
}

struct QueryStrategy {
    label: &'static str,
    filter: Filter,
    public_only: bool,
    needs_key: bool,
}

/// Tried in order; the first strategy returning relevant posts wins
const STRATEGIES: &[QueryStrategy] = &[
    QueryStrategy {
        label: "name-filtered public posts",
        filter: Filter::Name,
        public_only: true,
        needs_key: true,
    },
    QueryStrategy {
        label: "name-filtered posts",
        filter: Filter::Name,
        public_only: false,
        needs_key: true,
    },
    QueryStrategy {
        label: "symbol-filtered public posts",
        filter: Filter::Symbol,
        public_only: true,
        needs_key: true,
    },
    QueryStrategy {
        label: "public feed",
        filter: Filter::None,
        public_only: true,
        needs_key: false,
    },
];

/// News facade with memoization and notice degradation
///
/// `fetch_news` is infallible: provider failures fall through the
/// strategy ladder and end in notice items.
pub struct NewsClient {
    api: Arc<dyn PostsApi>,
    cache: TtlCache<String, Vec<NewsItem>>,
}

impl NewsClient {
    pub fn from_env() -> Self {
        Self::new(Arc::new(CryptoPanicApi::from_env()))
    }

    pub fn new(api: Arc<dyn PostsApi>) -> Self {
        Self {
            api,
            cache: TtlCache::default(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    /// Fetch up to `limit` headlines for a token.
    ///
    /// Successful results are cached per token and limit; notices are
    /// not, so live headlines replace them as soon as a provider
    /// recovers.
    pub async fn fetch_news(&self, token: &TokenIdentity, limit: usize) -> Vec<NewsItem> {
        let key = format!("{}:{}", token.name.to_lowercase(), limit);
        if let Some(items) = self.cache.get(&key).await {
            tracing::debug!(token = %token.symbol, "news cache hit");
            return items;
        }

        for strategy in STRATEGIES {
            if strategy.needs_key && !self.api.has_key() {
                tracing::debug!(strategy = strategy.label, "skipped, no API key");
                continue;
            }

            let name_filter = token.name.to_lowercase();
            let symbol_filter = token.symbol.to_lowercase();
            let currencies = match strategy.filter {
                Filter::Name => Some(name_filter.as_str()),
                Filter::Symbol => Some(symbol_filter.as_str()),
                Filter::None => None,
            };

            match self.api.fetch_posts(currencies, strategy.public_only).await {
                Ok(posts) => {
                    let mut items = convert(posts);
                    if matches!(strategy.filter, Filter::None) {
                        items.retain(|item| title_matches(item, token));
                    }
                    if items.is_empty() {
                        tracing::debug!(
                            strategy = strategy.label,
                            token = %token.symbol,
                            "no relevant items"
                        );
                        continue;
                    }
                    items.truncate(limit);
                    tracing::debug!(
                        strategy = strategy.label,
                        token = %token.symbol,
                        count = items.len(),
                        "headlines fetched"
                    );
                    self.cache.insert(key, items.clone()).await;
                    return items;
                }
                Err(error) => {
                    tracing::warn!(
                        strategy = strategy.label,
                        token = %token.symbol,
                        %error,
                        "news strategy failed"
                    );
                }
            }
        }

        tracing::warn!(token = %token.symbol, "news ladder exhausted, returning notices");
        notice_items(token, self.api.has_key())
    }
}

fn convert(posts: Vec<RawPost>) -> Vec<NewsItem> {
    posts
        .into_iter()
        .filter(|post| !post.title.trim().is_empty())
        .map(|post| NewsItem {
            title: post.title,
            url: post.url.unwrap_or_default(),
            source: post
                .source
                .and_then(|source| source.title.or(source.domain))
                .unwrap_or_else(|| "Unknown".to_string()),
            kind: post.kind.unwrap_or_else(|| "news".to_string()),
            published_at: post.published_at.unwrap_or_else(Utc::now),
            votes_positive: post.votes.unwrap_or_default().positive,
            votes_negative: post.votes.unwrap_or_default().negative,
        })
        .collect()
}

fn title_matches(item: &NewsItem, token: &TokenIdentity) -> bool {
    let title = item.title.to_lowercase();
    title.contains(&token.name.to_lowercase()) || title.contains(&token.symbol.to_lowercase())
}

fn notice_items(token: &TokenIdentity, has_key: bool) -> Vec<NewsItem> {
    let second = if has_key {
        "The news provider returned no matching posts; try again later.".to_string()
    } else {
        "No news API key configured. Set CRYPTOPANIC_API_KEY to enable live headlines."
            .to_string()
    };
    vec![
        NewsItem::notice(format!(
            "Live headlines for {} are currently unavailable.",
            token.label()
        )),
        NewsItem::notice(second),
    ]
}
