use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use tracing::{debug, info};

use super::gpt2::{Gpt2Config, Gpt2Model};
use super::tokenizer::PromptTokenizer;
use crate::config::{GenerationConfig, ModelConfig};
use crate::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

/// Produces a continuation of a prompt. The returned text is the decoded
/// prompt followed by the generated tokens, special tokens removed.
///
/// Implementations are shared read-only across requests.
#[cfg_attr(test, mockall::automock)]
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationConfig) -> Result<String>;

    /// Human-readable identifier of the loaded model.
    fn model_id(&self) -> String;
}

pub struct Gpt2Generator {
    model: Gpt2Model,
    tokenizer: PromptTokenizer,
    model_dir: PathBuf,
}

impl Gpt2Generator {
    /// Loads the model and tokenizer from `config.directory`.
    pub fn load(config: &ModelConfig, generation: &GenerationConfig) -> Result<Self> {
        let device = if config.use_gpu {
            Device::cuda_if_available(0)?
        } else {
            Device::Cpu
        };
        Self::load_on(&config.directory, generation, &device)
    }

    pub fn load_on(dir: &Path, generation: &GenerationConfig, device: &Device) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::model_load(format!(
                "model directory {} does not exist; run download-model first",
                dir.display()
            )));
        }
        info!(directory = %dir.display(), ?device, "Loading model and tokenizer");

        let gpt2_config = read_config(&dir.join(CONFIG_FILE))?;
        let vb = weights(dir, device)?;
        let model = Gpt2Model::load(&gpt2_config, vb)
            .map_err(|e| Error::model_load(format!("failed to build GPT-2: {e}")))?;

        let max_input_tokens = generation.max_input_tokens.min(gpt2_config.n_positions);
        let tokenizer = PromptTokenizer::from_file(
            &dir.join(TOKENIZER_FILE),
            gpt2_config.eos_token_id,
            max_input_tokens,
        )?;

        if tokenizer.vocab_size() > gpt2_config.vocab_size {
            return Err(Error::model_load(format!(
                "tokenizer vocabulary ({}) is larger than the model's ({})",
                tokenizer.vocab_size(),
                gpt2_config.vocab_size
            )));
        }

        info!(
            layers = gpt2_config.n_layer,
            embd = gpt2_config.n_embd,
            vocab = gpt2_config.vocab_size,
            eos_token_id = tokenizer.eos_token_id(),
            pad_token_id = tokenizer.pad_token_id(),
            "Model and tokenizer loaded successfully from local directory"
        );

        Ok(Self {
            model,
            tokenizer,
            model_dir: dir.to_path_buf(),
        })
    }

    /// Token ids for `prompt` followed by the sampled continuation.
    pub fn generate_ids(&self, prompt: &str, params: &GenerationConfig) -> Result<Vec<u32>> {
        let mut tokens = self.tokenizer.encode(prompt)?;
        if tokens.is_empty() {
            return Err(Error::generation("prompt encoded to zero tokens"));
        }

        let n_positions = self.model.config().n_positions;
        let limit = params.max_length.min(n_positions);
        let budget = limit.saturating_sub(tokens.len());
        // Unlike HF `generate`, a prompt that already fills `max_length` gets no new token.
        if budget == 0 {
            debug!(
                prompt_tokens = tokens.len(),
                max_length = params.max_length,
                "Prompt already fills max_length, nothing to generate"
            );
            return Ok(tokens);
        }

        let seed = params.seed.unwrap_or_else(rand::random);
        let mut sampler = LogitsProcessor::from_sampling(seed, sampling(params));
        let mut cache = self.model.new_cache();
        let eos = self.tokenizer.eos_token_id();
        let device = self.model.device();

        let prompt_len = tokens.len();
        let mut input = tokens.clone();
        for _ in 0..budget {
            let ids = Tensor::new(input.as_slice(), device)?.unsqueeze(0)?;
            let logits = self.model.forward(&ids, &mut cache)?;
            let next = sampler.sample(&logits)?;
            tokens.push(next);
            if next == eos {
                break;
            }
            input = vec![next];
        }

        debug!(
            prompt_tokens = prompt_len,
            generated = tokens.len() - prompt_len,
            "Generation finished"
        );
        Ok(tokens)
    }
}

impl TextGenerator for Gpt2Generator {
    fn generate(&self, prompt: &str, params: &GenerationConfig) -> Result<String> {
        let ids = self.generate_ids(prompt, params)?;
        self.tokenizer.decode(&ids)
    }

    fn model_id(&self) -> String {
        self.model_dir.display().to_string()
    }
}

/// Maps the sampling settings onto candle's logits processor. Top-k is applied
/// before top-p; `top_p >= 1.0` leaves only the rank cutoff.
pub fn sampling(params: &GenerationConfig) -> Sampling {
    if !params.do_sample {
        return Sampling::ArgMax;
    }
    if params.top_p >= 1.0 {
        Sampling::TopK {
            k: params.top_k,
            temperature: params.temperature,
        }
    } else {
        Sampling::TopKThenTopP {
            k: params.top_k,
            p: params.top_p,
            temperature: params.temperature,
        }
    }
}

fn read_config(path: &Path) -> Result<Gpt2Config> {
    if !path.exists() {
        return Err(Error::MissingModelFile {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn weights(dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = dir.join(SAFETENSORS_FILE);
    if safetensors.exists() {
        let tensors = candle_core::safetensors::load(&safetensors, device)?;
        return Ok(VarBuilder::from_tensors(tensors, DType::F32, device));
    }

    let pytorch = dir.join(PYTORCH_FILE);
    if pytorch.exists() {
        return Ok(VarBuilder::from_pth(&pytorch, DType::F32, device)?);
    }

    Err(Error::MissingModelFile { path: safetensors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sampling_follows_config() {
        let mut params = GenerationConfig::default();
        assert!(matches!(
            sampling(&params),
            Sampling::TopKThenTopP { k: 50, .. }
        ));

        params.top_p = 1.0;
        assert!(matches!(sampling(&params), Sampling::TopK { k: 50, .. }));

        params.do_sample = false;
        assert!(matches!(sampling(&params), Sampling::ArgMax));
    }

    #[test]
    fn test_missing_directory_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gpt2-model");

        let err = Gpt2Generator::load_on(&missing, &GenerationConfig::default(), &Device::Cpu)
            .err()
            .unwrap();

        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[test]
    fn test_missing_config_file_is_named() {
        let dir = tempfile::tempdir().unwrap();

        let err = Gpt2Generator::load_on(dir.path(), &GenerationConfig::default(), &Device::Cpu)
            .err()
            .unwrap();

        match err {
            Error::MissingModelFile { path } => assert_eq!(path, dir.path().join("config.json")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
