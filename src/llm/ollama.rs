use crate::error::{Result, TitanError};
use crate::llm::gateway::ChatGateway;
use crate::llm::models::{ChatMessage, GatewayResponse, MessageRole, ToolCall};
use crate::tools::ToolDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration for connecting to an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}

/// Gateway for a locally hosted Ollama service.
///
/// Uses the non-streaming `/api/chat` endpoint for completions with tool
/// calling, and `/api/tags` for model discovery. No explicit request timeout
/// is configured; calls block until the client's defaults give up.
pub struct OllamaGateway {
    client: Client,
    config: OllamaConfig,
}

impl OllamaGateway {
    /// Create a gateway with default configuration
    pub fn new() -> Self {
        Self::with_config(OllamaConfig::default())
    }

    /// Create a gateway with custom configuration
    pub fn with_config(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a gateway pointed at a custom host
    pub fn with_host(host: impl Into<String>) -> Self {
        Self::with_config(OllamaConfig { host: host.into() })
    }

    /// The host this gateway talks to
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

impl Default for OllamaGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for OllamaGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<GatewayResponse> {
        info!("Requesting Ollama completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let ollama_messages = adapt_messages_to_ollama(messages)?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": ollama_messages,
            "stream": false
        });

        if let Some(tools) = tools {
            body["tools"] = serde_json::to_value(tools)?;
        }

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.host))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TitanError::GatewayError(format!(
                "Ollama API error: {}",
                response.status()
            )));
        }

        let response_body: Value = response.json().await?;

        let content = response_body["message"]["content"].as_str().map(String::from);
        let tool_calls = parse_tool_calls(&response_body);

        Ok(GatewayResponse {
            content,
            tool_calls,
        })
    }

    async fn available_models(&self) -> Result<Vec<String>> {
        debug!("Fetching available Ollama models");

        let response = self
            .client
            .get(format!("{}/api/tags", self.config.host))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TitanError::GatewayError(format!(
                "failed to list models, status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let models = body["models"]
            .as_array()
            .ok_or_else(|| TitanError::GatewayError("invalid /api/tags response".to_string()))?
            .iter()
            .filter_map(|m| m["name"].as_str().map(String::from))
            .collect::<Vec<_>>();

        Ok(models)
    }
}

// Native tool calls live under message.tool_calls; calls with a malformed
// function block are dropped.
fn parse_tool_calls(response_body: &Value) -> Vec<ToolCall> {
    let Some(calls) = response_body["message"]["tool_calls"].as_array() else {
        return vec![];
    };

    calls
        .iter()
        .filter_map(|call| {
            let name = call["function"]["name"].as_str()?.to_string();
            let args = call["function"]["arguments"].as_object()?;

            let arguments: HashMap<String, Value> =
                args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

            Some(ToolCall {
                id: call["id"].as_str().map(String::from),
                name,
                arguments,
            })
        })
        .collect()
}

// Ollama wants a plain content string and function-wrapped tool calls.
fn adapt_messages_to_ollama(messages: &[ChatMessage]) -> Result<Vec<Value>> {
    messages
        .iter()
        .map(|msg| {
            let mut ollama_msg = serde_json::json!({
                "role": match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "tool",
                },
                "content": msg.content.as_deref().unwrap_or("")
            });

            if let Some(tool_calls) = &msg.tool_calls {
                let calls: Vec<_> = tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": tc.arguments
                            }
                        })
                    })
                    .collect();
                ollama_msg["tool_calls"] = serde_json::to_value(calls)?;
            }

            Ok(ollama_msg)
        })
        .collect()
}
