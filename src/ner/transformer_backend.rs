//! Transformer-based recognition backend ("bert").
//!
//! Sends texts to a token-classification inference endpoint compatible with
//! the Hugging Face inference API:
//!
//! ```text
//! POST {endpoint}/models/{model}
//! {"inputs": ["..."], "parameters": {"aggregation_strategy": "simple"}}
//! ```
//!
//! The response holds one list of `{entity_group, score, word, start, end}`
//! per input text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::backend::{BackendKind, NerBackend, NerError};
use super::span::{RawSpans, TransformerSpan};

/// Directory NER model fine-tuned on Paris trade directories.
pub const DEFAULT_MODEL: &str = "HueyNemud/berties";

/// Configuration for the transformer backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Inference API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier, appended to `{endpoint}/models/`.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Maximum number of texts per request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send one probe request when loading, so an unreachable model fails
    /// as unavailable instead of at first inference.
    #[serde(default = "default_probe_on_load")]
    pub probe_on_load: bool,
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_probe_on_load() -> bool {
    true
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_token: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            probe_on_load: default_probe_on_load(),
        }
    }
}

impl TransformerConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Full URL of the model's inference route.
    pub fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.endpoint.trim_end_matches('/'),
            self.model.trim_matches('/')
        )
    }
}

/// Inference API request format.
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    aggregation_strategy: &'static str,
}

/// Error body returned by the inference API.
#[derive(Debug, Deserialize)]
struct InferenceError {
    error: String,
}

/// HTTP client bound to one model.
struct InferenceClient {
    http: Client,
    url: String,
    api_token: Option<String>,
}

impl InferenceClient {
    async fn post(&self, inputs: &[String]) -> Result<Vec<Vec<TransformerSpan>>, String> {
        let request = InferenceRequest {
            inputs,
            parameters: InferenceParameters {
                aggregation_strategy: "simple",
            },
        };

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(ref token) = self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("HTTP request to {} failed: {}", self.url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<InferenceError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(format!("Inference API error ({}): {}", status, message));
        }

        serde_json::from_str(&body).map_err(|e| format!("Failed to parse response: {}", e))
    }
}

/// Transformer-based backend.
pub struct TransformerBackend {
    config: TransformerConfig,
    client: OnceCell<InferenceClient>,
}

impl TransformerBackend {
    pub fn new(config: TransformerConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    fn unavailable(reason: impl Into<String>) -> NerError {
        NerError::BackendUnavailable {
            backend: BackendKind::Bert,
            reason: reason.into(),
        }
    }

    async fn connect(&self) -> Result<InferenceClient, NerError> {
        if self.config.endpoint.trim().is_empty() {
            return Err(Self::unavailable("No inference endpoint configured"));
        }
        if self.config.model.trim().is_empty() {
            return Err(Self::unavailable("No model configured"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| Self::unavailable(format!("Failed to create HTTP client: {}", e)))?;

        let client = InferenceClient {
            http,
            url: self.config.model_url(),
            api_token: self.config.api_token.clone(),
        };

        if self.config.probe_on_load {
            client
                .post(&["Paris".to_string()])
                .await
                .map_err(|e| Self::unavailable(format!("Model probe failed: {}", e)))?;
        }

        info!("Connected to transformer model at {}", client.url);
        Ok(client)
    }

    /// Get or create the client; concurrent first callers share one load.
    async fn client(&self) -> Result<&InferenceClient, NerError> {
        self.client.get_or_try_init(|| self.connect()).await
    }
}

impl Default for TransformerBackend {
    fn default() -> Self {
        Self::new(TransformerConfig::default())
    }
}

#[async_trait]
impl NerBackend for TransformerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Bert
    }

    fn availability_hint(&self) -> String {
        format!(
            "Inference endpoint must serve model {} at {}",
            self.config.model,
            self.config.model_url()
        )
    }

    async fn ensure_loaded(&self) -> Result<(), NerError> {
        self.client().await.map(|_| ())
    }

    async fn recognize(&self, texts: &[String]) -> Result<Vec<RawSpans>, NerError> {
        let client = self.client().await?;
        let mut results = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            let spans = client
                .post(chunk)
                .await
                .map_err(|reason| NerError::RecognitionFailed {
                    backend: BackendKind::Bert,
                    reason,
                })?;

            if spans.len() != chunk.len() {
                return Err(NerError::RecognitionFailed {
                    backend: BackendKind::Bert,
                    reason: format!(
                        "Expected {} span lists, got {}",
                        chunk.len(),
                        spans.len()
                    ),
                });
            }

            debug!("Transformer model tagged {} texts", chunk.len());
            results.extend(spans.into_iter().map(RawSpans::Transformer));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransformerConfig::default();
        assert_eq!(config.model, "HueyNemud/berties");
        assert_eq!(
            config.model_url(),
            "https://api-inference.huggingface.co/models/HueyNemud/berties"
        );
        assert!(config.probe_on_load);
    }

    #[test]
    fn test_model_url_trims_slashes() {
        let config = TransformerConfig::default()
            .with_endpoint("http://localhost:8080/")
            .with_model("/local/berties");
        assert_eq!(config.model_url(), "http://localhost:8080/models/local/berties");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TransformerConfig =
            toml::from_str("endpoint = \"http://ner.local\"\nbatch_size = 4").unwrap();
        assert_eq!(config.endpoint, "http://ner.local");
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_request_body_shape() {
        let inputs = vec!["Beaumont, fab.".to_string()];
        let request = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                aggregation_strategy: "simple",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"][0], "Beaumont, fab.");
        assert_eq!(json["parameters"]["aggregation_strategy"], "simple");
    }

    #[test]
    fn test_response_parses_into_spans() {
        let body = r#"[[{"entity_group": "PER", "score": 0.99, "word": "Beaumont", "start": 0, "end": 8}], []]"#;
        let parsed: Vec<Vec<TransformerSpan>> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0][0].entity_group, "PER");
        assert!(parsed[1].is_empty());
    }

    #[tokio::test]
    async fn test_empty_endpoint_is_unavailable() {
        let backend = TransformerBackend::new(TransformerConfig::default().with_endpoint(" "));
        let err = backend.ensure_loaded().await.unwrap_err();
        assert!(matches!(
            err,
            NerError::BackendUnavailable {
                backend: BackendKind::Bert,
                ..
            }
        ));
    }
}
