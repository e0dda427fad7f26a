//! Configuration for the lookup tools.
//!
//! API keys and provider endpoints live in an explicit [`ToolConfig`] passed
//! into the toolbox at construction, rather than being read from the process
//! environment at call time. Tests assemble a config pointing at local mock
//! servers; the binary builds one from the environment after loading `.env`.

/// Keys and endpoints for the external lookup providers.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Serper.dev API key (`SERPER_API_KEY`). `None` degrades the search tool
    /// to a configuration-error string.
    pub serper_api_key: Option<String>,
    /// OpenWeatherMap API key (`OPENWEATHERMAP_API_KEY`). `None` degrades the
    /// weather tool to a configuration-error string.
    pub openweathermap_api_key: Option<String>,
    /// Search provider base URL.
    pub search_endpoint: String,
    /// Weather provider base URL.
    pub weather_endpoint: String,
    /// IP-geolocation provider base URL.
    pub geo_endpoint: String,
}

const SEARCH_ENDPOINT: &str = "https://google.serper.dev";
const WEATHER_ENDPOINT: &str = "https://api.openweathermap.org";
const GEO_ENDPOINT: &str = "http://ip-api.com";

impl ToolConfig {
    /// Build a config from the process environment.
    ///
    /// Missing keys are not an error; the affected tool reports the missing
    /// configuration as its result instead.
    pub fn from_env() -> Self {
        Self {
            serper_api_key: std::env::var("SERPER_API_KEY").ok().filter(|k| !k.is_empty()),
            openweathermap_api_key: std::env::var("OPENWEATHERMAP_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            openweathermap_api_key: None,
            search_endpoint: SEARCH_ENDPOINT.to_string(),
            weather_endpoint: WEATHER_ENDPOINT.to_string(),
            geo_endpoint: GEO_ENDPOINT.to_string(),
        }
    }
}
