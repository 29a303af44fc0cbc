use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::GenerationParameters;

/// Body of `POST /predictions/{sd_model}`. The response is a JSON pixel array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
    pub height: u32,
    pub width: u32,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>, params: &GenerationParameters) -> Self {
        Self {
            prompt: prompt.into(),
            guidance_scale: params.guidance_scale,
            num_inference_steps: params.num_inference_steps,
            height: params.height,
            width: params.width,
        }
    }
}

/// A decoded image together with the prompt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub image: DynamicImage,
    pub caption: String,
}

impl GeneratedImage {
    pub fn new(image: DynamicImage, caption: impl Into<String>) -> Self {
        Self {
            image,
            caption: caption.into(),
        }
    }
}
