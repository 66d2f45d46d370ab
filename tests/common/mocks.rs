use ai_query_server::{Error, Result, config::GenerationConfig, model::TextGenerator};
use std::sync::{Arc, Mutex};

/// Mock generator that echoes the prompt followed by a canned continuation,
/// the way a causal model's decoded output does.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    pub continuation: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub error: Option<String>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            continuation: "This is a generated answer.".to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    pub fn with_continuation(mut self, continuation: &str) -> Self {
        self.continuation = continuation.to_string();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str, _params: &GenerationConfig) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(ref error) = self.error {
            return Err(Error::generation(error.clone()));
        }

        Ok(format!("{} {}", prompt, self.continuation))
    }

    fn model_id(&self) -> String {
        "mock-model".to_string()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}
