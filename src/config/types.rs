use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Local directory holding `config.json`, the weights and `tokenizer.json`.
    #[serde(default = "default_model_directory")]
    pub directory: PathBuf,
    /// Hub repository the download tool fetches from.
    #[serde(default = "default_repo_id")]
    pub repo_id: String,
    #[serde(default = "default_revision")]
    pub revision: String,
    /// Run on the first CUDA device when one is available.
    #[serde(default)]
    pub use_gpu: bool,
}

/// Sampling settings shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on prompt plus generated tokens.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            directory: default_model_directory(),
            repo_id: default_repo_id(),
            revision: default_revision(),
            use_gpu: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            do_sample: default_do_sample(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            temperature: default_temperature(),
            seed: None,
            max_input_tokens: default_max_input_tokens(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_directory() -> PathBuf {
    PathBuf::from("gpt2-model")
}

fn default_repo_id() -> String {
    "gpt2".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_max_length() -> usize {
    100
}

fn default_do_sample() -> bool {
    true
}

fn default_top_k() -> usize {
    50
}

fn default_top_p() -> f64 {
    0.95
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_input_tokens() -> usize {
    1024
}
