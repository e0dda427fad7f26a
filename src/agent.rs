use crate::error::Result;
use crate::llm::gateway::ChatGateway;
use crate::llm::models::{ChatMessage, ToolCall};
use crate::tools::{all_descriptors, ToolDescriptor, Toolbox};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are Titan, a helpful personal assistant. You have access to a variety of tools to answer user questions.\n\
For questions about the current weather, use the 'get_weather' tool.\n\
For questions about your current location, use the 'location' tool.\n\
For general information and web searches, use the 'search' tool.\n\
For the current time, use the 'Time' tool.\n\
If you cannot find an answer using the provided tools, respond with a polite message stating you cannot assist with that request.";

/// A conversational agent backed by an Ollama-hosted model.
///
/// Each user turn makes at most two round trips to the model: one to obtain
/// the reply (and any tool calls), and one follow-up carrying tool output.
/// Turn history is rebuilt from scratch on every call; nothing persists
/// between turns.
pub struct TitanAgent {
    model: String,
    gateway: Arc<dyn ChatGateway>,
    toolbox: Toolbox,
    descriptors: Vec<ToolDescriptor>,
}

impl TitanAgent {
    pub fn new(model: impl Into<String>, gateway: Arc<dyn ChatGateway>, toolbox: Toolbox) -> Self {
        Self {
            model: model.into(),
            gateway,
            toolbox,
            descriptors: all_descriptors(),
        }
    }

    /// The model this agent is configured for
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Advisory connectivity probe, run once before the interactive loop.
    ///
    /// Succeeds only when the host answers the model listing and the exact
    /// configured model name is present in it.
    pub async fn check_connection(&self) -> (bool, String) {
        match self.gateway.available_models().await {
            Ok(models) if models.iter().any(|m| m == &self.model) => (
                true,
                format!(
                    "Successfully connected to Ollama and model '{}' is available.",
                    self.model
                ),
            ),
            Ok(_) => (
                false,
                format!(
                    "Model '{}' not found. Please pull it with 'ollama pull {}'.",
                    self.model, self.model
                ),
            ),
            Err(e) => (false, format!("Failed to reach Ollama: {}. Is Ollama running?", e)),
        }
    }

    /// Process one user turn and produce the final answer.
    ///
    /// Tool calls are taken from the model's structured output, or failing
    /// that from [`parse_fallback_tool_call`] on the raw reply text. Calls
    /// naming unregistered tools are skipped without surfacing an error.
    pub async fn respond(&self, user_text: &str) -> Result<String> {
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_text),
        ];

        let response = self
            .gateway
            .complete(&self.model, &messages, Some(&self.descriptors))
            .await?;

        let mut tool_calls = response.tool_calls;
        if tool_calls.is_empty() {
            if let Some(content) = response.content.as_deref() {
                if let Some(call) = parse_fallback_tool_call(content) {
                    debug!("Synthesized tool call from reply text: {}", call.name);
                    tool_calls = vec![call];
                }
            }
        }

        if tool_calls.is_empty() {
            return Ok(response.content.unwrap_or_default());
        }

        info!("Tool calls requested: {}", tool_calls.len());

        let mut results = Vec::new();
        for call in &tool_calls {
            if let Some(result) = self.toolbox.dispatch(call).await {
                results.push(result);
            }
        }

        messages.push(ChatMessage::assistant_tool_calls(tool_calls));
        messages.extend(results.iter().map(ChatMessage::tool));

        let followup = self
            .gateway
            .complete(&self.model, &messages, Some(&self.descriptors))
            .await?;

        Ok(followup.content.unwrap_or_default())
    }
}

/// Best-effort recovery of a tool call from raw reply text.
///
/// Some models emit the call as a bare JSON object in the message content
/// instead of using structured output. Accepts exactly one object exposing a
/// string `name` and an object `parameters`; everything else is `None`.
pub fn parse_fallback_tool_call(text: &str) -> Option<ToolCall> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }

    let parsed: Value = serde_json::from_str(trimmed).ok()?;
    let name = parsed.get("name")?.as_str()?.to_string();
    let params = parsed.get("parameters")?.as_object()?;

    let arguments: HashMap<String, Value> =
        params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    Some(ToolCall {
        id: Some("manual_call".to_string()),
        name,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::error::TitanError;
    use crate::llm::models::GatewayResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    // Scripted gateway: pops pre-baked responses and records every request's
    // message list for inspection.
    struct MockGateway {
        responses: Mutex<Vec<GatewayResponse>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        models: std::result::Result<Vec<String>, String>,
    }

    impl MockGateway {
        fn new(responses: Vec<GatewayResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
                models: Ok(vec!["llama3.2:latest".to_string()]),
            }
        }

        fn with_models(models: std::result::Result<Vec<String>, String>) -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                models,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, idx: usize) -> Vec<ChatMessage> {
            self.requests.lock().unwrap()[idx].clone()
        }
    }

    #[async_trait]
    impl ChatGateway for MockGateway {
        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolDescriptor]>,
        ) -> Result<GatewayResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());

            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(GatewayResponse {
                    content: Some("default response".to_string()),
                    tool_calls: vec![],
                })
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn available_models(&self) -> Result<Vec<String>> {
            self.models
                .clone()
                .map_err(TitanError::GatewayError)
        }
    }

    fn text_response(content: &str) -> GatewayResponse {
        GatewayResponse {
            content: Some(content.to_string()),
            tool_calls: vec![],
        }
    }

    fn tool_call(name: &str, arguments: HashMap<String, Value>) -> ToolCall {
        ToolCall {
            id: Some("call_1".to_string()),
            name: name.to_string(),
            arguments,
        }
    }

    fn agent_with(gateway: Arc<MockGateway>) -> TitanAgent {
        TitanAgent::new("llama3.2:latest", gateway, Toolbox::new(ToolConfig::default()))
    }

    #[test]
    fn test_parse_fallback_valid() {
        let call = parse_fallback_tool_call(r#"{"name": "Time", "parameters": {}}"#).unwrap();

        assert_eq!(call.name, "Time");
        assert_eq!(call.id.as_deref(), Some("manual_call"));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_parse_fallback_with_arguments_and_whitespace() {
        let text = "  \n {\"name\": \"get_weather\", \"parameters\": {\"location\": \"Cairo\"}} \n";
        let call = parse_fallback_tool_call(text).unwrap();

        assert_eq!(call.name, "get_weather");
        assert_eq!(call.arguments["location"], json!("Cairo"));
    }

    #[test]
    fn test_parse_fallback_rejects_plain_text() {
        assert!(parse_fallback_tool_call("The weather is nice today.").is_none());
    }

    #[test]
    fn test_parse_fallback_rejects_invalid_json() {
        assert!(parse_fallback_tool_call("{not json}").is_none());
    }

    #[test]
    fn test_parse_fallback_rejects_missing_keys() {
        assert!(parse_fallback_tool_call(r#"{"name": "Time"}"#).is_none());
        assert!(parse_fallback_tool_call(r#"{"parameters": {}}"#).is_none());
    }

    #[test]
    fn test_parse_fallback_rejects_wrong_types() {
        assert!(parse_fallback_tool_call(r#"{"name": 42, "parameters": {}}"#).is_none());
        assert!(parse_fallback_tool_call(r#"{"name": "Time", "parameters": []}"#).is_none());
    }

    #[test]
    fn test_parse_fallback_rejects_embedded_object() {
        // only a reply that is entirely the object counts
        let text = r#"Sure! {"name": "Time", "parameters": {}}"#;
        assert!(parse_fallback_tool_call(text).is_none());
    }

    #[tokio::test]
    async fn test_respond_plain_reply_single_request() {
        let gateway = Arc::new(MockGateway::new(vec![text_response("Hello there!")]));
        let agent = agent_with(gateway.clone());

        let answer = agent.respond("hi").await.unwrap();

        assert_eq!(answer, "Hello there!");
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_respond_json_like_but_not_a_call() {
        let gateway =
            Arc::new(MockGateway::new(vec![text_response(r#"{"answer": "42"}"#)]));
        let agent = agent_with(gateway.clone());

        let answer = agent.respond("meaning of life?").await.unwrap();

        // returned unchanged, no follow-up issued
        assert_eq!(answer, r#"{"answer": "42"}"#);
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_respond_fallback_call_runs_tool_and_follows_up() {
        let gateway = Arc::new(MockGateway::new(vec![
            text_response(r#"{"name": "Time", "parameters": {}}"#),
            text_response("It is noon in Egypt."),
        ]));
        let agent = agent_with(gateway.clone());

        let answer = agent.respond("what time is it?").await.unwrap();

        assert_eq!(answer, "It is noon in Egypt.");
        assert_eq!(gateway.request_count(), 2);

        let followup = gateway.request(1);
        // [system, user, assistant tool-call, tool result]
        assert_eq!(followup.len(), 4);
        let assistant = &followup[2];
        let calls = assistant.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].name, "Time");
        assert_eq!(calls[0].id.as_deref(), Some("manual_call"));

        let tool_msg = &followup[3];
        assert!(tool_msg
            .content
            .as_deref()
            .unwrap()
            .starts_with("The current time in Egypt is "));
    }

    #[tokio::test]
    async fn test_respond_unknown_tool_skipped_but_completes() {
        let gateway = Arc::new(MockGateway::new(vec![
            GatewayResponse {
                content: None,
                tool_calls: vec![tool_call("get_stock_price", HashMap::new())],
            },
            text_response("I cannot assist with that request."),
        ]));
        let agent = agent_with(gateway.clone());

        let answer = agent.respond("price of AAPL?").await.unwrap();

        assert_eq!(answer, "I cannot assist with that request.");
        assert_eq!(gateway.request_count(), 2);

        // follow-up carries the attempted call but no tool output
        let followup = gateway.request(1);
        assert_eq!(followup.len(), 3);
        assert!(followup[2].tool_calls.is_some());
    }

    #[tokio::test]
    async fn test_respond_mixed_known_and_unknown_calls() {
        let mut time_args = HashMap::new();
        time_args.insert("location".to_string(), json!("Cairo"));

        let gateway = Arc::new(MockGateway::new(vec![
            GatewayResponse {
                content: None,
                tool_calls: vec![
                    tool_call("not_a_tool", HashMap::new()),
                    tool_call("Time", time_args),
                ],
            },
            text_response("final"),
        ]));
        let agent = agent_with(gateway.clone());

        let answer = agent.respond("time in Cairo?").await.unwrap();
        assert_eq!(answer, "final");

        let followup = gateway.request(1);
        // one tool result, for the resolvable call only
        assert_eq!(followup.len(), 4);
        assert!(followup[3]
            .content
            .as_deref()
            .unwrap()
            .starts_with("The current time in Cairo is "));
    }

    #[tokio::test]
    async fn test_respond_weather_error_forwarded_to_followup() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let toolbox = Toolbox::new(ToolConfig {
            openweathermap_api_key: Some("invalid-key".to_string()),
            weather_endpoint: server.url(),
            ..ToolConfig::default()
        });

        let mut args = HashMap::new();
        args.insert("location".to_string(), json!("Cairo"));

        let gateway = Arc::new(MockGateway::new(vec![
            GatewayResponse {
                content: None,
                tool_calls: vec![tool_call("get_weather", args)],
            },
            text_response("Sorry, I could not fetch the weather for Cairo."),
        ]));
        let agent = TitanAgent::new("llama3.2:latest", gateway.clone(), toolbox);

        let answer = agent.respond("what's the weather in Cairo").await.unwrap();

        assert_eq!(answer, "Sorry, I could not fetch the weather for Cairo.");
        let followup = gateway.request(1);
        let tool_msg = followup[3].content.as_deref().unwrap();
        assert!(tool_msg.contains("Weather data for Cairo not available"));
    }

    #[tokio::test]
    async fn test_check_connection_model_available() {
        let gateway = Arc::new(MockGateway::with_models(Ok(vec![
            "mistral".to_string(),
            "llama3.2:latest".to_string(),
        ])));
        let agent = agent_with(gateway);

        let (ok, msg) = agent.check_connection().await;
        assert!(ok);
        assert!(msg.contains("model 'llama3.2:latest' is available"));
    }

    #[tokio::test]
    async fn test_check_connection_model_missing() {
        let gateway = Arc::new(MockGateway::with_models(Ok(vec!["mistral".to_string()])));
        let agent = agent_with(gateway);

        let (ok, msg) = agent.check_connection().await;
        assert!(!ok);
        assert!(msg.contains("Model 'llama3.2:latest' not found"));
        assert!(msg.contains("ollama pull llama3.2:latest"));
    }

    #[tokio::test]
    async fn test_check_connection_name_must_match_exactly() {
        let gateway = Arc::new(MockGateway::with_models(Ok(vec![
            "llama3.2".to_string(),
            "llama3.2:latest-custom".to_string(),
        ])));
        let agent = agent_with(gateway);

        let (ok, _) = agent.check_connection().await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_check_connection_host_unreachable() {
        let gateway = Arc::new(MockGateway::with_models(Err(
            "connection refused".to_string()
        )));
        let agent = agent_with(gateway);

        let (ok, msg) = agent.check_connection().await;
        assert!(!ok);
        assert!(!msg.is_empty());
        assert!(msg.contains("Is Ollama running?"));
    }
}
