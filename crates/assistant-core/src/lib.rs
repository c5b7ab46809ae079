//! # assistant-core
//!
//! Core types for the crypto analysis assistant: token resolution,
//! domain models, prompt assembly, and the generation provider trait.
//!
//! The analysis pipeline flows through these types:
//!
//! ```text
//! free-text query
//!       |
//!   TokenRegistry::resolve
//!       |
//!  TokenIdentity ----> market + news fetches (assistant-data)
//!       |                    |
//!       +----> AnalysisRequest
//!                    |
//!               build_prompt ----> GenerationProvider::generate
//! ```

pub mod error;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod token;

pub use error::{AssistantError, Result};
pub use model::{MarketSnapshot, NewsItem, PriceSnapshot};
pub use prompt::{build_prompt, AnalysisRequest, Depth, Language, PROMPT_NEWS_LIMIT};
pub use provider::{GenerationProvider, SamplingOptions};
pub use token::{TokenIdentity, TokenRegistry};
