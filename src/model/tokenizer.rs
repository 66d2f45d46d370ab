use std::path::Path;

use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::{Error, Result};

pub const DEFAULT_EOS_TOKEN: &str = "<|endoftext|>";

/// `tokenizers::Tokenizer` configured for single-prompt generation: truncation
/// on, and a padding token guaranteed to exist.
#[derive(Clone)]
pub struct PromptTokenizer {
    inner: Tokenizer,
    eos_token_id: u32,
    pad_token_id: u32,
}

impl PromptTokenizer {
    /// Loads `tokenizer.json`. `eos_token_id` comes from the model config when
    /// it declares one; otherwise the `<|endoftext|>` token is used.
    pub fn from_file(
        path: &Path,
        eos_token_id: Option<u32>,
        max_input_tokens: usize,
    ) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingModelFile {
                path: path.to_path_buf(),
            });
        }
        let inner = Tokenizer::from_file(path).map_err(|e| Error::tokenizer(e.to_string()))?;
        Self::new(inner, eos_token_id, max_input_tokens)
    }

    pub fn new(
        mut inner: Tokenizer,
        eos_token_id: Option<u32>,
        max_input_tokens: usize,
    ) -> Result<Self> {
        let eos_token_id = match eos_token_id {
            Some(id) => id,
            None => inner.token_to_id(DEFAULT_EOS_TOKEN).ok_or_else(|| {
                Error::tokenizer(format!(
                    "no eos_token_id configured and {DEFAULT_EOS_TOKEN} is not in the vocabulary"
                ))
            })?,
        };

        let pad_token_id = match inner.get_padding() {
            Some(padding) => padding.pad_id,
            None => {
                let eos_token = inner
                    .id_to_token(eos_token_id)
                    .unwrap_or_else(|| DEFAULT_EOS_TOKEN.to_string());
                info!(
                    pad_token = %eos_token,
                    pad_token_id = eos_token_id,
                    "Tokenizer has no padding token, aliasing it to eos"
                );
                inner.with_padding(Some(PaddingParams {
                    pad_id: eos_token_id,
                    pad_token: eos_token,
                    ..Default::default()
                }));
                eos_token_id
            }
        };

        inner
            .with_truncation(Some(TruncationParams {
                max_length: max_input_tokens,
                ..Default::default()
            }))
            .map_err(|e| Error::tokenizer(e.to_string()))?;

        Ok(Self {
            inner,
            eos_token_id,
            pad_token_id,
        })
    }

    pub fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }

    pub fn pad_token_id(&self) -> u32 {
        self.pad_token_id
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    /// Token ids for `text`, truncated to the configured input length. Padding
    /// is stripped again since a single prompt never needs it.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| Error::tokenizer(e.to_string()))?;

        let ids: Vec<u32> = encoding
            .get_ids()
            .iter()
            .zip(encoding.get_attention_mask())
            .filter(|(_, mask)| **mask == 1)
            .map(|(id, _)| *id)
            .collect();
        debug!(tokens = ids.len(), "Encoded prompt");
        Ok(ids)
    }

    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| Error::tokenizer(e.to_string()))
    }
}
