use ai_query_server::{
    config::{Config, GenerationConfig},
    model::{Gpt2Config, Gpt2Model},
    server::{self, AppState},
};
use axum::Router;
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower_http::cors::CorsLayer;

use super::mocks::MockGenerator;

/// Word-level tokenizer whose vocabulary matches [`tiny_gpt2_config`].
pub const WORD_TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {"id": 0, "content": "<|endoftext|>", "single_word": false, "lstrip": false,
     "rstrip": false, "normalized": false, "special": true}
  ],
  "normalizer": null,
  "pre_tokenizer": {"type": "Whitespace"},
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "<|endoftext|>": 0, "<unk>": 1, "Page": 2, "Data": 3, ":": 4, "Query": 5,
      "what": 6, "is": 7, "rust": 8, "a": 9, "language": 10, "fast": 11,
      "safe": 12, "the": 13, "course": 14, "covers": 15, "iot": 16, "basics": 17,
      "and": 18, "blockchain": 19, "?": 20, "yes": 21, "no": 22, "maybe": 23
    },
    "unk_token": "<unk>"
  }
}"#;

pub fn tiny_gpt2_config() -> Gpt2Config {
    Gpt2Config {
        vocab_size: 24,
        n_positions: 64,
        n_embd: 16,
        n_layer: 2,
        n_head: 4,
        layer_norm_epsilon: 1e-5,
        eos_token_id: Some(0),
    }
}

/// Writes a randomly initialised GPT-2 checkpoint plus tokenizer into `dir`.
/// With `prefixed`, tensors are stored under `transformer.` like
/// `save_pretrained` output.
pub fn write_tiny_checkpoint(dir: &Path, prefixed: bool) {
    let config = tiny_gpt2_config();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let vb = if prefixed { vb.pp("transformer") } else { vb };
    Gpt2Model::load(&config, vb).expect("build tiny model");
    varmap
        .save(dir.join("model.safetensors"))
        .expect("save weights");

    let config_json = serde_json::json!({
        "vocab_size": config.vocab_size,
        "n_positions": config.n_positions,
        "n_embd": config.n_embd,
        "n_layer": config.n_layer,
        "n_head": config.n_head,
        "layer_norm_epsilon": config.layer_norm_epsilon,
        "eos_token_id": 0,
    });
    std::fs::write(dir.join("config.json"), config_json.to_string()).expect("write config");
    std::fs::write(dir.join("tokenizer.json"), WORD_TOKENIZER_JSON).expect("write tokenizer");
}

/// Temporary model directory holding a tiny checkpoint.
pub fn create_model_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    write_tiny_checkpoint(dir.path(), false);
    dir
}

/// Create a test configuration with sensible defaults
pub fn create_test_config(model_dir: &Path) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.logs.level = "debug".to_string();
    config.model.directory = model_dir.to_path_buf();
    config.generation = GenerationConfig {
        seed: Some(42),
        max_length: 24,
        ..GenerationConfig::default()
    };
    config
}

pub fn create_test_app(generator: MockGenerator) -> Router {
    let state = AppState {
        generator: Arc::new(generator),
        generation: Arc::new(GenerationConfig::default()),
    };
    server::router(state, CorsLayer::permissive())
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 5001
  logs:
    level: "debug"
  cors_allowed_origins:
    - "http://localhost:3000"

model:
  directory: "models/gpt2"
  repo_id: "openai-community/gpt2"

generation:
  max_length: 80
  top_k: 40
  top_p: 0.9
  seed: 1234
"#;
