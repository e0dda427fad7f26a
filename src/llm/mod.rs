pub mod gateway;
pub mod models;
pub mod ollama;

pub use gateway::ChatGateway;
pub use models::{ChatMessage, GatewayResponse, MessageRole, ToolCall, ToolResult};
pub use ollama::{OllamaConfig, OllamaGateway};
