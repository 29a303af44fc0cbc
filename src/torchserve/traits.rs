use crate::{
    error::Result,
    models::{HealthReport, ImageGenerationRequest, TextGenerationRequest},
};
use async_trait::async_trait;

/// A text model that answers a prompt with raw text.
#[async_trait]
pub trait TextBackend: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &TextGenerationRequest) -> Result<String>;
}

/// An image model that answers a prompt with a raw (undecoded) pixel payload.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &ImageGenerationRequest) -> Result<String>;
}

/// Reports whether the inference host and both models can take requests.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn probe(&self) -> HealthReport;
}
