pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use agent::TitanAgent;
pub use config::ToolConfig;
pub use error::{Result, TitanError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::TitanAgent;
    pub use crate::config::ToolConfig;
    pub use crate::error::{Result, TitanError};
    pub use crate::llm::{ChatGateway, ChatMessage, MessageRole, OllamaGateway};
    pub use crate::tools::{ToolName, Toolbox};
}
