use crate::traits::{LlmClient, LlmResponse, TextStream};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use websift_common::{Result, WebsiftError};
use websift_http::HttpClient;

/// Client for OpenAI-compatible chat-completion endpoints.
pub struct OpenAiClient {
    http: HttpClient,
    stream_http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u32>,
}

/// One SSE chunk of a streamed completion.
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
}

#[derive(Debug, Deserialize)]
struct ChatStreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client for the given endpoint, API key, and model.
    pub fn new(endpoint: &str, api_key: String, model: String) -> Result<Self> {
        // The base must end in a slash or `Url::join` replaces the last
        // path segment instead of appending.
        let base_url = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let http = HttpClient::new(&base_url)
            .map_err(|e| WebsiftError::Llm(format!("HttpClient init failed: {e}")))?;
        let stream_http = reqwest::Client::new();

        Ok(Self {
            http,
            stream_http,
            base_url,
            api_key,
            model,
        })
    }

    fn build_messages<'a>(
        prompt: &'a str,
        system_prompt: Option<&'a str>,
    ) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        messages
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(prompt, system_prompt),
            max_tokens,
            temperature,
            stream: false,
        };

        let resp: ChatResponse = self
            .http
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(|e| WebsiftError::Llm(e.to_string()))?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<TextStream> {
        let req = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(prompt, system_prompt),
            max_tokens,
            temperature,
            stream: true,
        };

        let url = format!("{}chat/completions", self.base_url);
        let resp = self
            .stream_http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| WebsiftError::Llm(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WebsiftError::Llm(format!(
                "stream request failed with {status}: {body}"
            )));
        }

        let mut bytes = resp.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut buf = String::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| WebsiftError::Llm(e.to_string()))?;
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    let line = line.trim();
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        break 'read;
                    }
                    if let Ok(chunk) = serde_json::from_str::<ChatStreamChunk>(data) {
                        if let Some(delta) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                        {
                            if !delta.is_empty() {
                                yield delta;
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<bool> {
        let test_prompt = "Respond with just 'OK'";
        match self.generate(test_prompt, None, Some(5), Some(0.1)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
