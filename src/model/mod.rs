mod generator;
pub mod gpt2;
mod tokenizer;

pub use generator::{Gpt2Generator, TextGenerator, sampling};
pub use gpt2::{Gpt2Cache, Gpt2Config, Gpt2Model};
pub use tokenizer::{DEFAULT_EOS_TOKEN, PromptTokenizer};

#[cfg(test)]
pub use generator::MockTextGenerator;
