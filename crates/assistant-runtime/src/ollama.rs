//! Ollama Client
//!
//! Local generation backend. Every call starts with a short probe of
//! /api/tags; when the probe fails, no generation endpoint is tried and
//! the caller gets a localized connection diagnostic. When the server is
//! up, /api/generate is tried first with /api/chat as the fallback.
//! `generate` never fails: exhausted endpoints degrade to a localized
//! diagnostic naming the model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use assistant_core::{GenerationProvider, Language, SamplingOptions};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(45);
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors internal to the Ollama client; they never cross the
/// `GenerationProvider` boundary.
#[derive(Error, Debug)]
enum GenerationError {
    #[error("cannot reach Ollama: {0}")]
    Unreachable(String),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("{endpoint} returned an empty response")]
    Empty { endpoint: &'static str },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

type Result<T> = std::result::Result<T, GenerationError>;

/// Connection settings for the Ollama server
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Scheme and host, without the port
    pub host: String,

    pub port: u16,

    /// Model used when a request does not name one
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1".to_string(),
            port: 11434,
            model: "llama2".to_string(),
        }
    }
}

impl OllamaConfig {
    /// Settings from OLLAMA_HOST, OLLAMA_PORT, and OLLAMA_MODEL; a host
    /// without a scheme gets http:// prepended.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST")
            .map(|value| {
                if value.starts_with("http://") || value.starts_with("https://") {
                    value
                } else {
                    format!("http://{value}")
                }
            })
            .unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.port);
        let model = std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model);
        Self { host, port, model }
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Generation endpoint trait (Strategy pattern)
///
/// One implementation per Ollama generation API; tried in order.
#[async_trait]
trait GenerationEndpoint: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: SamplingOptions,
    ) -> Result<String>;

    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
}

impl From<SamplingOptions> for OllamaOptions {
    fn from(options: SamplingOptions) -> Self {
        Self {
            temperature: options.temperature,
            num_predict: options.num_predict,
            top_p: options.top_p,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

struct CompletionEndpoint {
    http: Client,
    base_url: String,
}

#[async_trait]
impl GenerationEndpoint for CompletionEndpoint {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: SamplingOptions,
    ) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(GENERATE_TIMEOUT)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
                options: options.into(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                endpoint: "/api/generate",
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text = body.response.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::Empty {
                endpoint: "/api/generate",
            });
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "/api/generate"
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

struct ChatEndpoint {
    http: Client,
    base_url: String,
}

#[async_trait]
impl GenerationEndpoint for ChatEndpoint {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: SamplingOptions,
    ) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .timeout(CHAT_TIMEOUT)
            .json(&ChatRequest {
                model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                stream: false,
                options: options.into(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                endpoint: "/api/chat",
                status: status.as_u16(),
            });
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .message
            .map(|message| message.content)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(GenerationError::Empty {
                endpoint: "/api/chat",
            });
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "/api/chat"
    }
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

/// Ollama-backed `GenerationProvider`
pub struct OllamaClient {
    config: OllamaConfig,
    http: Client,
    endpoints: Vec<Arc<dyn GenerationEndpoint>>,
    options: SamplingOptions,
}

impl OllamaClient {
    pub fn from_config(config: OllamaConfig) -> Self {
        let http = Client::new();
        let base_url = config.base_url();
        let endpoints: Vec<Arc<dyn GenerationEndpoint>> = vec![
            Arc::new(CompletionEndpoint {
                http: http.clone(),
                base_url: base_url.clone(),
            }),
            Arc::new(ChatEndpoint {
                http: http.clone(),
                base_url,
            }),
        ];
        Self {
            config,
            http,
            endpoints,
            options: SamplingOptions::default(),
        }
    }

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..OllamaConfig::default()
        })
    }

    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    pub fn localhost() -> Self {
        Self::from_config(OllamaConfig::default())
    }

    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }

    /// Model used when a request does not name one
    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    /// List installed models via /api/tags. Doubles as the reachability
    /// probe that gates every generation call.
    async fn probe(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.base_url());
        let response = self
            .http
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|error| GenerationError::Unreachable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                endpoint: "/api/tags",
                status: status.as_u16(),
            });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }

    async fn run_endpoints(&self, prompt: &str, model: &str, language: Language) -> String {
        for endpoint in &self.endpoints {
            match endpoint.generate(prompt, model, self.options).await {
                Ok(text) => {
                    tracing::debug!(endpoint = endpoint.name(), model, "generation succeeded");
                    return text;
                }
                Err(error) => {
                    tracing::warn!(
                        endpoint = endpoint.name(),
                        model,
                        %error,
                        "generation endpoint failed"
                    );
                }
            }
        }
        exhausted_message(language, model)
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn generate(&self, prompt: &str, model: &str, language: Language) -> String {
        // An unreachable server short-circuits: no generation endpoint
        // is tried until the probe passes.
        if let Err(error) = self.probe().await {
            tracing::warn!(%error, "Ollama probe failed");
            return connection_message(language, &self.config.base_url());
        }
        self.run_endpoints(prompt, model, language).await
    }

    async fn health_check(&self) -> bool {
        self.probe().await.is_ok()
    }

    async fn list_models(&self) -> Vec<String> {
        self.probe().await.unwrap_or_default()
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

fn connection_message(language: Language, base_url: &str) -> String {
    match language {
        Language::Russian => format!(
            "Не удалось подключиться к серверу генерации по адресу {base_url}. \
             Убедитесь, что Ollama запущена (команда: ollama serve), и повторите запрос."
        ),
        Language::English => format!(
            "Could not connect to the generation server at {base_url}. \
             Make sure Ollama is running (ollama serve) and try again."
        ),
    }
}

fn exhausted_message(language: Language, model: &str) -> String {
    match language {
        Language::Russian => format!(
            "Сервер генерации не вернул ответ для модели {model}. \
             Возможно, модель не установлена (ollama pull {model}) \
             или запрос превысил время ожидания."
        ),
        Language::English => format!(
            "The generation server returned no response for model {model}. \
             The model may not be installed (ollama pull {model}) \
             or the request timed out."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedEndpoint {
        endpoint: &'static str,
        calls: Arc<AtomicU32>,
        text: Option<&'static str>,
    }

    impl ScriptedEndpoint {
        fn ok(endpoint: &'static str, text: &'static str) -> (Arc<Self>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let scripted = Arc::new(Self {
                endpoint,
                calls: calls.clone(),
                text: Some(text),
            });
            (scripted, calls)
        }

        fn failing(endpoint: &'static str) -> (Arc<Self>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let scripted = Arc::new(Self {
                endpoint,
                calls: calls.clone(),
                text: None,
            });
            (scripted, calls)
        }
    }

    #[async_trait]
    impl GenerationEndpoint for ScriptedEndpoint {
        async fn generate(
            &self,
            _prompt: &str,
            _model: &str,
            _options: SamplingOptions,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.text {
                Some(text) => Ok(text.to_string()),
                None => Err(GenerationError::Empty {
                    endpoint: self.endpoint,
                }),
            }
        }

        fn name(&self) -> &'static str {
            self.endpoint
        }
    }

    fn client_with_endpoints(
        port: u16,
        endpoints: Vec<Arc<dyn GenerationEndpoint>>,
    ) -> OllamaClient {
        OllamaClient {
            config: OllamaConfig {
                port,
                ..OllamaConfig::default()
            },
            http: Client::new(),
            endpoints,
            options: SamplingOptions::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://127.0.0.1");
        assert_eq!(config.port, 11434);
        assert_eq!(config.model, "llama2");
        assert_eq!(config.base_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_options_wire_format() {
        let options = OllamaOptions::from(SamplingOptions::default());
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["num_predict"], 500);
        assert!(value["temperature"].is_number());
        assert!(value["top_p"].is_number());
    }

    #[tokio::test]
    async fn test_failed_probe_skips_generation_endpoints() {
        let (endpoint, calls) = ScriptedEndpoint::ok("/api/generate", "should not run");
        let client = client_with_endpoints(1, vec![endpoint]);

        let text = client
            .generate("prompt", "llama2", Language::English)
            .await;

        assert!(text.contains("Could not connect"));
        assert!(text.contains("ollama serve"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(!client.health_check().await);
        assert!(client.list_models().await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_endpoint_covers_generate_failure() {
        let (generate, generate_calls) = ScriptedEndpoint::failing("/api/generate");
        let (chat, chat_calls) = ScriptedEndpoint::ok("/api/chat", "analysis text");
        let client = client_with_endpoints(11434, vec![generate, chat]);

        let text = client
            .run_endpoints("prompt", "llama2", Language::English)
            .await;

        assert_eq!(text, "analysis text");
        assert_eq!(generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let (generate, _) = ScriptedEndpoint::ok("/api/generate", "first answer");
        let (chat, chat_calls) = ScriptedEndpoint::failing("/api/chat");
        let client = client_with_endpoints(11434, vec![generate, chat]);

        let text = client
            .run_endpoints("prompt", "llama2", Language::English)
            .await;

        assert_eq!(text, "first answer");
        assert_eq!(chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_endpoints_name_the_model() {
        let (generate, _) = ScriptedEndpoint::failing("/api/generate");
        let (chat, _) = ScriptedEndpoint::failing("/api/chat");
        let client = client_with_endpoints(11434, vec![generate, chat]);

        let text = client
            .run_endpoints("prompt", "mistral", Language::English)
            .await;

        assert!(text.contains("mistral"));
        assert!(text.contains("ollama pull"));
    }

    #[test]
    fn test_diagnostics_are_localized() {
        let russian = connection_message(Language::Russian, "http://127.0.0.1:11434");
        assert!(russian.contains("Не удалось подключиться"));
        assert!(russian.contains("ollama serve"));

        let english = exhausted_message(Language::English, "llama2");
        assert!(english.contains("llama2"));
        assert!(english.contains("ollama pull llama2"));

        let russian = exhausted_message(Language::Russian, "llama2");
        assert!(russian.contains("модель не установлена"));
    }
}
