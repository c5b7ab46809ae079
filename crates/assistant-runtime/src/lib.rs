//! # assistant-runtime
//!
//! Generation backends for the crypto analysis assistant. Currently
//! ships the Ollama client; any backend implementing
//! `assistant_core::GenerationProvider` plugs into the pipeline.

pub mod ollama;

pub use ollama::{OllamaClient, OllamaConfig};
