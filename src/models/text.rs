use serde::{Deserialize, Serialize};

use super::GenerationParameters;

/// Body of `POST /predictions/{llm_model}`. The response is raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
}

impl TextGenerationRequest {
    pub fn new(prompt: impl Into<String>, params: &GenerationParameters) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens: params.max_new_tokens,
            temperature: params.temperature,
            top_k: params.top_k,
        }
    }
}
