use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SMART_COMMERCE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub basket: BasketConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Locations of the raw entity CSVs and the processed feature table.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_raw_data_dir")]
    pub raw_data_dir: String,
    #[serde(default = "default_processed_data_dir")]
    pub processed_data_dir: String,
}

/// Parameters of the association-rule miner. The sample cap is a
/// deliberate scalability shortcut carried over from the source data:
/// changing it changes which rules are discoverable.
#[derive(Debug, Clone, Deserialize)]
pub struct BasketConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_min_item_freq")]
    pub min_item_freq: usize,
    #[serde(default = "default_min_support")]
    pub min_support: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    /// Query the seasonal/event/social trend sources. When off, the
    /// context agent skips the signal fetch entirely.
    #[serde(default = "default_signals_enabled")]
    pub signals_enabled: bool,
    /// Ask the LLM to narrow categories before ranking by city popularity.
    #[serde(default = "default_llm_category_selection")]
    pub llm_category_selection: bool,
    /// Seed for the degraded-mode category sample. None draws from entropy.
    #[serde(default)]
    pub category_sample_seed: Option<u64>,
    #[serde(default = "default_context_k")]
    pub default_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_raw_data_dir() -> String {
    "data/raw".to_string()
}
fn default_processed_data_dir() -> String {
    "data/processed".to_string()
}
fn default_sample_size() -> usize {
    30_000
}
fn default_min_item_freq() -> usize {
    10
}
fn default_min_support() -> f64 {
    0.0001
}
fn default_min_confidence() -> f64 {
    0.01
}
fn default_high_confidence() -> f64 {
    0.05
}
fn default_signals_enabled() -> bool {
    true
}
fn default_llm_category_selection() -> bool {
    false
}
fn default_context_k() -> usize {
    6
}
fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: default_raw_data_dir(),
            processed_data_dir: default_processed_data_dir(),
        }
    }
}

impl Default for BasketConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            min_item_freq: default_min_item_freq(),
            min_support: default_min_support(),
            min_confidence: default_min_confidence(),
            high_confidence: default_high_confidence(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            signals_enabled: default_signals_enabled(),
            llm_category_selection: default_llm_category_selection(),
            category_sample_seed: None,
            default_k: default_context_k(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            pipeline: PipelineConfig::default(),
            basket: BasketConfig::default(),
            context: ContextConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SMART_COMMERCE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
