//! Token Resolution
//!
//! Maps free-text queries ("tell me about ethereum", "btc price") to
//! canonical token identities. Resolution is layered: exact alias match on
//! the normalized query, then query-shape patterns, then a per-word
//! fallback with substring containment. An unresolvable query is an
//! explicit miss; the resolver never substitutes a default token.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

/// Words stripped from queries before alias lookup
const STOP_WORDS: &[&str] = &[
    "about", "tell", "me", "what", "is", "the", "price", "of", "analysis",
    "news", "latest", "current", "today", "now", "cryptocurrency", "crypto",
    "coin", "token", "currency",
];

/// Query shapes tried in order; the first capture that resolves wins
const QUERY_PATTERNS: &[&str] = &[
    r"about\s+(\w+)",
    r"tell.*about\s+(\w+)",
    r"what.*is\s+(\w+)",
    r"price.*of\s+(\w+)",
    r"analysis.*of\s+(\w+)",
    r"(\w+)\s+price",
    r"(\w+)\s+analysis",
    r"(\w+)\s+news",
    r"buy\s+(\w+)",
    r"sell\s+(\w+)",
    r"(\w+)(?:\s+cryptocurrency|\s+crypto|\s+coin|\s+token)?$",
];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    QUERY_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("query pattern compiles"))
        .collect()
});

/// Seed rows: (name, symbol, provider id, extra aliases)
const SEED_TOKENS: &[(&str, &str, &str, &[&str])] = &[
    ("Bitcoin", "BTC", "bitcoin", &[]),
    ("Ethereum", "ETH", "ethereum", &["ether"]),
    ("Binance Coin", "BNB", "binancecoin", &["binance"]),
    ("Cardano", "ADA", "cardano", &[]),
    ("Solana", "SOL", "solana", &[]),
    ("Polkadot", "DOT", "polkadot", &[]),
    ("Chainlink", "LINK", "chainlink", &[]),
    ("Litecoin", "LTC", "litecoin", &[]),
    ("Polygon", "MATIC", "matic-network", &[]),
    ("Avalanche", "AVAX", "avalanche-2", &[]),
    ("Dogecoin", "DOGE", "dogecoin", &[]),
    ("Shiba Inu", "SHIB", "shiba-inu", &["shiba"]),
    ("XRP", "XRP", "ripple", &["ripple"]),
    ("Tether", "USDT", "tether", &[]),
    ("USD Coin", "USDC", "usd-coin", &[]),
    ("Dai", "DAI", "dai", &[]),
    ("Uniswap", "UNI", "uniswap", &[]),
    ("Aave", "AAVE", "aave", &[]),
    ("Compound", "COMP", "compound-governance-token", &[]),
    ("Arbitrum", "ARB", "arbitrum", &[]),
    ("Optimism", "OP", "optimism", &[]),
];

/// A canonical token identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    /// Display name (e.g., "Ethereum")
    pub name: String,

    /// Ticker symbol, upper-case (e.g., "ETH")
    pub symbol: String,

    /// Market-data provider id (e.g., "ethereum")
    pub provider_id: String,

    /// Lower-case lookup keys beyond name and symbol
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

impl TokenIdentity {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into().to_uppercase(),
            provider_id: provider_id.into(),
            aliases: BTreeSet::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|alias| alias.into().to_lowercase()));
        self
    }

    /// "Ethereum (ETH)" form used in prompts and listings
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

/// Alias table mapping lower-case keys to token identities
///
/// Backed by an ordered map so that resolution and listings are
/// deterministic for a given registry state.
#[derive(Clone, Debug, Default)]
pub struct TokenRegistry {
    entries: BTreeMap<String, TokenIdentity>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registry pre-seeded with the major tokens
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, symbol, provider_id, aliases) in SEED_TOKENS {
            let identity = TokenIdentity::new(*name, *symbol, *provider_id)
                .with_aliases(aliases.iter().copied());
            registry.insert(identity);
        }
        registry
    }

    fn insert(&mut self, identity: TokenIdentity) {
        let mut keys: BTreeSet<String> = identity.aliases.clone();
        keys.insert(identity.name.to_lowercase());
        keys.insert(identity.symbol.to_lowercase());
        for key in keys {
            self.entries.insert(key, identity.clone());
        }
    }

    /// Register a custom token; its name, symbol, and aliases all become
    /// lookup keys.
    pub fn register(&mut self, identity: TokenIdentity) -> Result<TokenIdentity> {
        if identity.name.trim().is_empty() || identity.symbol.trim().is_empty() {
            return Err(AssistantError::InvalidToken(
                "name and symbol must be non-empty".into(),
            ));
        }
        if identity.provider_id.trim().is_empty() {
            return Err(AssistantError::InvalidToken(
                "provider id must be non-empty".into(),
            ));
        }
        self.insert(identity.clone());
        tracing::debug!(token = %identity.symbol, "registered token");
        Ok(identity)
    }

    /// Resolve a free-text query to a token identity.
    ///
    /// Tries, in order: exact match on the normalized query, query-shape
    /// patterns on the raw lowered text, then per-word exact and
    /// substring matches. Returns `None` when nothing matches.
    pub fn resolve(&self, query: &str) -> Option<TokenIdentity> {
        let lowered = query.to_lowercase();
        let normalized = normalize(query);

        if let Some(identity) = self.entries.get(&normalized) {
            return Some(identity.clone());
        }

        for pattern in PATTERNS.iter() {
            if let Some(captures) = pattern.captures(&lowered) {
                if let Some(candidate) = captures.get(1) {
                    if let Some(identity) = self.entries.get(candidate.as_str()) {
                        tracing::debug!(
                            query,
                            pattern = pattern.as_str(),
                            token = %identity.symbol,
                            "resolved via query pattern"
                        );
                        return Some(identity.clone());
                    }
                }
            }
        }

        for word in normalized.split_whitespace() {
            if let Some(identity) = self.entries.get(word) {
                return Some(identity.clone());
            }
            // Substring containment in either direction; short words are
            // too noisy for this.
            if word.len() > 2 {
                for (key, identity) in &self.entries {
                    if key.contains(word) || word.contains(key.as_str()) {
                        return Some(identity.clone());
                    }
                }
            }
        }

        None
    }

    /// Sorted, de-duplicated "Name (SYMBOL)" listing
    pub fn supported(&self) -> Vec<String> {
        let labels: BTreeSet<String> =
            self.entries.values().map(TokenIdentity::label).collect();
        labels.into_iter().collect()
    }

    /// Alias keys resembling the query, for "did you mean" hints
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let lowered = query.to_lowercase();
        let mut matches = BTreeSet::new();
        for word in lowered.split_whitespace() {
            for key in self.entries.keys() {
                if key.contains(word) || word.contains(key.as_str()) {
                    matches.insert(key.clone());
                }
            }
        }
        matches.into_iter().take(limit).collect()
    }

    /// Number of distinct registered tokens
    pub fn token_count(&self) -> usize {
        self.entries
            .values()
            .map(|identity| &identity.symbol)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Lowercase, strip punctuation, drop stop words
fn normalize(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
