//! Provider‑agnostic LLM integration for Websift.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for OpenAI-compatible endpoints and Ollama. Both
//! support one-shot generation and delta streaming; the pipeline uses the
//! one-shot form for query formulation and the streaming form for answer
//! synthesis.
pub mod ollama;
pub mod openai;
pub mod traits;

use ollama::OllamaClient;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;
use websift_common::Result;

/// Default model recommendations.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Provider settings resolved from configuration.
#[derive(Debug, Clone)]
pub enum LlmSettings {
    OpenAi {
        endpoint: String,
        api_key: String,
        model: String,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
}

/// Ensure an LLM client is ready (e.g., probing local servers if needed).
pub async fn ensure_llm_ready(
    settings: &LlmSettings,
) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match settings {
        LlmSettings::OpenAi {
            endpoint,
            api_key,
            model,
        } => {
            let client = OpenAiClient::new(endpoint, api_key.clone(), model.clone())?;
            Ok(Arc::new(client))
        }
        LlmSettings::Ollama { endpoint, model } => {
            let client = OllamaClient::new(endpoint.clone(), model.clone()).await?;
            Ok(Arc::new(client))
        }
    }
}
