//! Prompt Assembly
//!
//! Renders resolved token data into a single localized prompt for the
//! generation backend. Assembly is pure: the same request always yields
//! the same prompt text.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{MarketSnapshot, NewsItem, PriceSnapshot};
use crate::token::TokenIdentity;

/// Headlines included in a prompt, regardless of how many were fetched
pub const PROMPT_NEWS_LIMIT: usize = 3;

/// Output language for prompts and diagnostics
///
/// Unrecognized wire values fall back to Russian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    Russian,
    English,
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "english" => Language::English,
            _ => Language::Russian,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Russian => write!(f, "russian"),
            Language::English => write!(f, "english"),
        }
    }
}

/// How thorough the requested analysis should be
///
/// Unrecognized wire values fall back to Detailed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Depth {
    Basic,
    #[default]
    Detailed,
    Comprehensive,
}

impl From<String> for Depth {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "basic" => Depth::Basic,
            "comprehensive" => Depth::Comprehensive,
            _ => Depth::Detailed,
        }
    }
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Depth::Basic => write!(f, "basic"),
            Depth::Detailed => write!(f, "detailed"),
            Depth::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

impl Depth {
    fn instruction(self, language: Language) -> &'static str {
        match (self, language) {
            (Depth::Basic, Language::Russian) => {
                "Дай краткий анализ (1-2 абзаца): текущее состояние рынка и общий вывод."
            }
            (Depth::Detailed, Language::Russian) => {
                "Дай подробный анализ (2-3 абзаца). Включи:\n\
                 1. Текущее состояние рынка\n\
                 2. Краткосрочный прогноз\n\
                 3. Основные факторы влияния"
            }
            (Depth::Comprehensive, Language::Russian) => {
                "Дай развёрнутый анализ (4-5 абзацев). Включи:\n\
                 1. Текущее состояние рынка\n\
                 2. Технический и фундаментальный контекст\n\
                 3. Краткосрочный и среднесрочный прогноз\n\
                 4. Основные риски и факторы влияния"
            }
            (Depth::Basic, Language::English) => {
                "Give a brief analysis (1-2 paragraphs): the current market state and an overall takeaway."
            }
            (Depth::Detailed, Language::English) => {
                "Give a detailed analysis (2-3 paragraphs). Include:\n\
                 1. Current market state\n\
                 2. Short-term outlook\n\
                 3. Key driving factors"
            }
            (Depth::Comprehensive, Language::English) => {
                "Give an in-depth analysis (4-5 paragraphs). Include:\n\
                 1. Current market state\n\
                 2. Technical and fundamental context\n\
                 3. Short- and medium-term outlook\n\
                 4. Key risks and driving factors"
            }
        }
    }
}

/// Everything the assembler needs to build one prompt
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    pub token: TokenIdentity,
    pub price: PriceSnapshot,
    pub market: MarketSnapshot,
    pub news: Vec<NewsItem>,
    pub language: Language,
    pub depth: Depth,
    pub model: String,
}

/// Build the localized analysis prompt for a request
pub fn build_prompt(request: &AnalysisRequest) -> String {
    match request.language {
        Language::Russian => russian_prompt(request),
        Language::English => english_prompt(request),
    }
}

fn russian_prompt(request: &AnalysisRequest) -> String {
    let market = &request.market;
    let rank_suffix = if market.rank > 0 {
        format!(" (место #{})", market.rank)
    } else {
        String::new()
    };
    format!(
        "Проанализируй криптовалюту {label} на основе следующих данных.\n\n\
         Рыночные данные (источник: {price_source}):\n\
         - Текущая цена: {current}\n\
         - Изменение за 24 часа: {change}\n\
         - Объём торгов за 24 часа: {volume}\n\
         - Диапазон за 24 часа: {low} - {high}\n\n\
         Обзор рынка (источник: {market_source}):\n\
         - Рыночная капитализация: {cap}{rank_suffix}\n\
         - Изменение за 7 дней: {week}, за 30 дней: {month}\n\
         - Исторический максимум: {ath}, исторический минимум: {atl}\n\
         - В обращении: {circulating} из {total}\n\n\
         {news}\n\n\
         {instruction}\n\n\
         Будь объективным и не давай финансовых советов. Ответь на русском языке.",
        label = request.token.label(),
        price_source = request.price.source,
        current = format_usd(request.price.price),
        change = format_percent(request.price.change_24h),
        volume = format_usd(request.price.volume_24h),
        low = format_usd(request.price.low_24h),
        high = format_usd(request.price.high_24h),
        market_source = market.source,
        cap = format_usd(market.market_cap),
        rank_suffix = rank_suffix,
        week = format_percent(market.change_7d),
        month = format_percent(market.change_30d),
        ath = format_usd(market.ath),
        atl = format_usd(market.atl),
        circulating = format_amount(market.circulating_supply),
        total = format_amount(market.total_supply),
        news = news_block(&request.news, request.language),
        instruction = request.depth.instruction(request.language),
    )
}

fn english_prompt(request: &AnalysisRequest) -> String {
    let market = &request.market;
    let rank_suffix = if market.rank > 0 {
        format!(" (rank #{})", market.rank)
    } else {
        String::new()
    };
    format!(
        "Analyze the cryptocurrency {label} based on the following data.\n\n\
         Market data (source: {price_source}):\n\
         - Current price: {current}\n\
         - 24h change: {change}\n\
         - 24h trading volume: {volume}\n\
         - 24h range: {low} - {high}\n\n\
         Market overview (source: {market_source}):\n\
         - Market cap: {cap}{rank_suffix}\n\
         - 7d change: {week}, 30d change: {month}\n\
         - All-time high: {ath}, all-time low: {atl}\n\
         - Circulating supply: {circulating} of {total}\n\n\
         {news}\n\n\
         {instruction}\n\n\
         Stay objective and do not give financial advice. Answer in English.",
        label = request.token.label(),
        price_source = request.price.source,
        current = format_usd(request.price.price),
        change = format_percent(request.price.change_24h),
        volume = format_usd(request.price.volume_24h),
        low = format_usd(request.price.low_24h),
        high = format_usd(request.price.high_24h),
        market_source = market.source,
        cap = format_usd(market.market_cap),
        rank_suffix = rank_suffix,
        week = format_percent(market.change_7d),
        month = format_percent(market.change_30d),
        ath = format_usd(market.ath),
        atl = format_usd(market.atl),
        circulating = format_amount(market.circulating_supply),
        total = format_amount(market.total_supply),
        news = news_block(&request.news, request.language),
        instruction = request.depth.instruction(request.language),
    )
}

fn news_block(items: &[NewsItem], language: Language) -> String {
    if items.is_empty() {
        return match language {
            Language::Russian => "Свежих новостей нет.".to_string(),
            Language::English => "No recent headlines.".to_string(),
        };
    }
    let mut block = match language {
        Language::Russian => "Последние новости:".to_string(),
        Language::English => "Recent headlines:".to_string(),
    };
    for (index, item) in items.iter().take(PROMPT_NEWS_LIMIT).enumerate() {
        block.push_str(&format!(
            "\n{}. {} ({}, {})",
            index + 1,
            item.title,
            item.source,
            item.published_at.format("%Y-%m-%d")
        ));
    }
    block
}

/// Compact a value into B/M/K buckets with two decimals; values under
/// one dollar keep six decimals so sub-cent tokens stay readable.
fn compact(value: Decimal) -> String {
    let abs = value.abs();
    let billion = Decimal::from(1_000_000_000_i64);
    let million = Decimal::from(1_000_000_i64);
    let thousand = Decimal::from(1_000_i64);
    if abs >= billion {
        format!("{:.2}B", value / billion)
    } else if abs >= million {
        format!("{:.2}M", value / million)
    } else if abs >= thousand {
        format!("{:.2}K", value / thousand)
    } else if abs >= Decimal::ONE || value == Decimal::ZERO {
        format!("{value:.2}")
    } else {
        format!("{value:.6}")
    }
}

pub fn format_usd(value: Decimal) -> String {
    format!("${}", compact(value))
}

pub fn format_percent(value: Decimal) -> String {
    // Decimal does not honor the `+` format flag, so sign manually
    if value.is_sign_negative() {
        format!("{value:.2}%")
    } else {
        format!("+{value:.2}%")
    }
}

pub fn format_amount(value: Decimal) -> String {
    compact(value)
}
