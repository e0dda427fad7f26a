use crate::config::ToolConfig;
use crate::llm::models::{ToolCall, ToolResult};
use crate::tools::descriptor::ToolName;
use chrono::{Local, Utc};
use chrono_tz::Africa::Cairo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};

const MAX_SEARCH_RESULTS: usize = 5;
const DEFAULT_TIME_LABEL: &str = "Egypt";
const DEFAULT_WEATHER_LOCATION: &str = "egypt";

/// Arguments accepted by the search tool
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: String,
}

/// Arguments accepted by the time tool
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimeArgs {
    pub location: Option<String>,
}

/// Arguments accepted by the weather tool
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeatherArgs {
    pub location: Option<String>,
    pub query: Option<String>,
}

/// The four lookup functions behind the agent's tool registry.
///
/// Every lookup returns a human-readable `String`, also on failure: provider
/// errors, missing keys, and transport problems are all rendered as text and
/// handed back to the model, never raised to the relay. Each invocation makes
/// at most one HTTP request.
pub struct Toolbox {
    config: ToolConfig,
    client: reqwest::Client,
}

impl Toolbox {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Execute a tool call. Returns `None` when the call names a tool that is
    /// not registered; the caller skips such calls without surfacing an error.
    pub async fn dispatch(&self, call: &ToolCall) -> Option<ToolResult> {
        let Some(tool) = ToolName::resolve(&call.name) else {
            warn!("Tool not registered: {}", call.name);
            return None;
        };

        info!("Executing tool: {}", call.name);

        let content = match tool {
            ToolName::Location => self.location().await,
            ToolName::Search => {
                let args: SearchArgs = parse_args(&call.arguments);
                self.search(&args.query).await
            }
            ToolName::Time => {
                let args: TimeArgs = parse_args(&call.arguments);
                self.time(args.location.as_deref())
            }
            ToolName::Weather => {
                let args: WeatherArgs = parse_args(&call.arguments);
                self.weather(args.location.as_deref(), args.query.as_deref()).await
            }
        };

        Some(ToolResult {
            call_id: call.id.clone(),
            content,
        })
    }

    /// Look up the current location from the public IP
    pub async fn location(&self) -> String {
        const NOT_FOUND: &str = "Address not found.";

        let url = format!("{}/json", self.config.geo_endpoint);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(_) => return NOT_FOUND.to_string(),
        };
        if !response.status().is_success() {
            return NOT_FOUND.to_string();
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(_) => return NOT_FOUND.to_string(),
        };
        if body["status"].as_str() != Some("success") {
            return NOT_FOUND.to_string();
        }

        let address = ["city", "regionName", "country"]
            .iter()
            .filter_map(|k| body[k].as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        if address.is_empty() {
            NOT_FOUND.to_string()
        } else {
            address
        }
    }

    /// Web search via Serper, top results formatted with a retrieval timestamp
    pub async fn search(&self, query: &str) -> String {
        let Some(api_key) = &self.config.serper_api_key else {
            return "Search API key not configured. Please set SERPER_API_KEY environment variable."
                .to_string();
        };

        let url = format!("{}/search", self.config.search_endpoint);
        let response = match self
            .client
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(_) => {
                return format!("Error performing search for '{}'. Please try again later.", query)
            }
        };

        if !response.status().is_success() {
            return format!(
                "Error searching for '{}'. Status code: {}",
                query,
                response.status().as_u16()
            );
        }

        let results: Value = match response.json().await {
            Ok(v) => v,
            Err(_) => {
                return format!("Error performing search for '{}'. Please try again later.", query)
            }
        };

        let organic = match results["organic"].as_array() {
            Some(entries) if !entries.is_empty() => entries,
            _ => return format!("No search results found for '{}'.", query),
        };

        let search_time = Local::now().format("%Y-%m-%d %H:%M:%S");

        let formatted: Vec<String> = organic
            .iter()
            .take(MAX_SEARCH_RESULTS)
            .enumerate()
            .map(|(idx, result)| {
                let title = result["title"].as_str().unwrap_or("No title");
                let link = result["link"].as_str().unwrap_or("No link");
                let snippet = result["snippet"].as_str().unwrap_or("No description");
                format!("{}. {}\nURL: {}\nDescription: {}\n", idx + 1, title, link, snippet)
            })
            .collect();

        format!("Search results as of {}:\n\n{}", search_time, formatted.join("\n"))
    }

    /// Current time, labeled with the caller's location name.
    ///
    /// The label's real timezone is deliberately ignored: the clock is always
    /// read in Africa/Cairo, whatever the label says.
    pub fn time(&self, location: Option<&str>) -> String {
        let label = location.filter(|l| !l.is_empty()).unwrap_or(DEFAULT_TIME_LABEL);
        let now = Utc::now().with_timezone(&Cairo);

        format!("The current time in {} is {}", label, now.format("%Y-%m-%d %H:%M:%S"))
    }

    /// Current weather via OpenWeatherMap
    pub async fn weather(&self, location: Option<&str>, query: Option<&str>) -> String {
        let location = location
            .filter(|l| !l.is_empty())
            .or_else(|| query.filter(|q| !q.is_empty()))
            .unwrap_or(DEFAULT_WEATHER_LOCATION);

        let Some(api_key) = &self.config.openweathermap_api_key else {
            return "Weather API key not configured. Please set OPENWEATHERMAP_API_KEY environment variable."
                .to_string();
        };

        let url = format!("{}/data/2.5/weather", self.config.weather_endpoint);
        let response = match self
            .client
            .get(&url)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(_) => {
                return format!(
                    "Error getting weather for {}. Please check the location name and try again.",
                    location
                )
            }
        };

        if !response.status().is_success() {
            return format!(
                "Weather data for {} not available. Error: {}",
                location,
                response.status().as_u16()
            );
        }

        let data: Value = match response.json().await {
            Ok(v) => v,
            Err(_) => {
                return format!(
                    "Error getting weather for {}. Please check the location name and try again.",
                    location
                )
            }
        };

        match (
            data["main"]["temp"].as_f64(),
            data["weather"][0]["description"].as_str(),
            data["main"]["humidity"].as_u64(),
        ) {
            (Some(temp), Some(condition), Some(humidity)) => format!(
                "Weather in {}: {}, {}°C, Humidity: {}%",
                location,
                capitalize(condition),
                temp,
                humidity
            ),
            _ => format!(
                "Error getting weather for {}. Please check the location name and try again.",
                location
            ),
        }
    }
}

// Argument maps come from the model and may be loosely typed. Unknown keys are
// ignored; a shape the struct cannot absorb falls back to the defaults rather
// than failing the whole turn.
fn parse_args<T: DeserializeOwned + Default>(arguments: &HashMap<String, Value>) -> T {
    serde_json::to_value(arguments)
        .and_then(serde_json::from_value)
        .unwrap_or_else(|e| {
            warn!("Malformed tool arguments, using defaults: {}", e);
            T::default()
        })
}

// Python-style capitalize: first character upper, the rest lower
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
