use crate::error::Result;
use crate::llm::models::{ChatMessage, GatewayResponse};
use crate::tools::ToolDescriptor;
use async_trait::async_trait;

/// Abstract interface to the chat model service.
///
/// The agent talks to the model exclusively through this trait, which keeps
/// the relay testable against a scripted in-memory gateway.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Complete a chat request, optionally advertising tools to the model
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<GatewayResponse>;

    /// List the model names available on the host
    async fn available_models(&self) -> Result<Vec<String>>;
}
