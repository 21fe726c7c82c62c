use crate::traits::{LlmClient, LlmResponse, TextStream};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use websift_common::{Result, WebsiftError};

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new client and verify the server is reachable.
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WebsiftError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        let ollama_client = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        };

        ollama_client.probe_server().await?;

        Ok(ollama_client)
    }

    async fn probe_server(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| WebsiftError::Llm(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(WebsiftError::Llm(OLLAMA_CONNECTION_ERROR.to_string()))
        }
    }

    fn build_payload(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        stream: bool,
    ) -> JsonValue {
        let mut options = serde_json::Map::new();
        if let Some(temp) = temperature {
            options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tok) = max_tokens {
            options.insert("num_predict".to_string(), json!(max_tok));
        }

        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": stream,
            "options": options,
        });
        if let Some(sys) = system_prompt {
            payload["system"] = json!(sys);
        }
        payload
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = self.build_payload(prompt, system_prompt, max_tokens, temperature, false);

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WebsiftError::Llm(format!("Generation request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(WebsiftError::Llm(format!(
                "Generation failed: HTTP {}",
                resp.status()
            )));
        }

        let val: JsonValue = resp
            .json()
            .await
            .map_err(|e| WebsiftError::Llm(format!("Failed to parse response: {}", e)))?;

        let text = val
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used: val
                .get("eval_count")
                .and_then(|c| c.as_u64())
                .map(|c| c as u32),
        })
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<TextStream> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = self.build_payload(prompt, system_prompt, max_tokens, temperature, true);

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WebsiftError::Llm(format!("Generation request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(WebsiftError::Llm(format!(
                "Generation failed: HTTP {}",
                resp.status()
            )));
        }

        // Ollama streams newline-delimited JSON objects with a `response`
        // delta and a terminal `done` flag.
        let mut bytes = resp.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut buf = String::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| WebsiftError::Llm(e.to_string()))?;
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let Ok(val) = serde_json::from_str::<JsonValue>(line) else {
                        continue;
                    };
                    if let Some(delta) = val.get("response").and_then(|r| r.as_str()) {
                        if !delta.is_empty() {
                            yield delta.to_string();
                        }
                    }
                    if val.get("done").and_then(|d| d.as_bool()).unwrap_or(false) {
                        break 'read;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.probe_server().await.is_ok())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
