use serde_json::{json, Value};

/// Descriptor for a tool function, in the shape Ollama's chat API expects
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDescriptor {
    pub r#type: String,
    pub function: FunctionDescriptor,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The fixed set of tools the agent exposes to the model.
///
/// Tool identity is a closed enum rather than a name-keyed map, so an
/// unknown name from the model is an explicit `None` from [`ToolName::resolve`]
/// instead of a silent lookup miss buried in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Location,
    Search,
    Time,
    Weather,
}

/// Every tool, in the order they are advertised to the model
pub const ALL_TOOLS: [ToolName; 4] = [
    ToolName::Location,
    ToolName::Search,
    ToolName::Time,
    ToolName::Weather,
];

impl ToolName {
    /// Resolve a wire name to a tool, `None` for unregistered names
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "location" => Some(Self::Location),
            "search" => Some(Self::Search),
            "Time" => Some(Self::Time),
            "get_weather" => Some(Self::Weather),
            _ => None,
        }
    }

    /// The name this tool is advertised and called by
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Search => "search",
            Self::Time => "Time",
            Self::Weather => "get_weather",
        }
    }

    /// Descriptor sent to the model with every completion request
    pub fn descriptor(&self) -> ToolDescriptor {
        let (description, parameters) = match self {
            Self::Location => (
                "Get the assistant's current location based on its public IP address.",
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            ),
            Self::Search => (
                "Perform a web search for general information. Returns titles, URLs, and snippets of the top results.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            Self::Time => (
                "Get the current date and time.",
                json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "Location name to label the time with"
                        }
                    },
                    "required": []
                }),
            ),
            Self::Weather => (
                "Get the current weather for a location.",
                json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "City or place name"
                        },
                        "query": {
                            "type": "string",
                            "description": "Alternative place name, used when location is absent"
                        }
                    },
                    "required": []
                }),
            ),
        };

        ToolDescriptor {
            r#type: "function".to_string(),
            function: FunctionDescriptor {
                name: self.as_str().to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Descriptors for every registered tool
pub fn all_descriptors() -> Vec<ToolDescriptor> {
    ALL_TOOLS.iter().map(|t| t.descriptor()).collect()
}
