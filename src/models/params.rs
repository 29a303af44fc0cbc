use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{GenError, Result};

pub const IMAGES_NUM_RANGE: RangeInclusive<usize> = 1..=4;
pub const MAX_NEW_TOKENS_RANGE: RangeInclusive<u32> = 30..=250;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const TOP_K_RANGE: RangeInclusive<u32> = 1..=200;
pub const STEPS_RANGE: RangeInclusive<u32> = 1..=150;
pub const GUIDANCE_SCALE_RANGE: RangeInclusive<f32> = 1.0..=30.0;
pub const DIMENSION_RANGE: RangeInclusive<u32> = 256..=2048;
pub const DIMENSION_STEP: u32 = 8;

/// Snapshot of the sidebar controls, taken once per generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub images_num: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub height: u32,
    pub width: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            images_num: 4,
            max_new_tokens: 50,
            temperature: 0.8,
            top_k: 200,
            num_inference_steps: 30,
            guidance_scale: 5.0,
            height: 768,
            width: 768,
        }
    }
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images_num(mut self, images_num: usize) -> Self {
        self.images_num = images_num;
        self
    }

    pub fn with_sampling(mut self, max_new_tokens: u32, temperature: f32, top_k: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self.temperature = temperature;
        self.top_k = top_k;
        self
    }

    pub fn with_size(mut self, height: u32, width: u32) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn with_diffusion(mut self, num_inference_steps: u32, guidance_scale: f32) -> Self {
        self.num_inference_steps = num_inference_steps;
        self.guidance_scale = guidance_scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_range("images_num", self.images_num, &IMAGES_NUM_RANGE)?;
        check_range("max_new_tokens", self.max_new_tokens, &MAX_NEW_TOKENS_RANGE)?;
        check_range("temperature", self.temperature, &TEMPERATURE_RANGE)?;
        check_range("top_k", self.top_k, &TOP_K_RANGE)?;
        check_range("num_inference_steps", self.num_inference_steps, &STEPS_RANGE)?;
        check_range("guidance_scale", self.guidance_scale, &GUIDANCE_SCALE_RANGE)?;
        check_range("height", self.height, &DIMENSION_RANGE)?;
        check_range("width", self.width, &DIMENSION_RANGE)?;

        for (name, value) in [("height", self.height), ("width", self.width)] {
            if value % DIMENSION_STEP != 0 {
                return Err(GenError::InvalidParameter(format!(
                    "{} must be a multiple of {}, got {}",
                    name, DIMENSION_STEP, value
                )));
            }
        }

        Ok(())
    }
}

fn check_range<T>(name: &str, value: T, range: &RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    // NaN fails `contains`, so it is rejected here too.
    if range.contains(&value) {
        Ok(())
    } else {
        Err(GenError::InvalidParameter(format!(
            "{} must be within {}..={}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}
