use crate::{
    error::{GenError, Result},
    models::ImageGenerationRequest,
    torchserve::traits::ImageBackend,
};
use async_trait::async_trait;
use reqwest::Client;

/// Posts one prompt to the image model. The underlying client is built without a
/// request timeout: large images can take arbitrarily long.
#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    url: String,
    model: String,
}

impl ImageClient {
    pub fn new(client: Client, inference_url: &str, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            client,
            url: format!("{}/predictions/{}", inference_url, model),
            model,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ImageBackend for ImageClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ImageGenerationRequest) -> Result<String> {
        log::info!(
            "Generating {}x{} image with model {}: {}",
            request.width,
            request.height,
            self.model,
            request.prompt
        );

        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::error!("Image model {} returned {}", self.model, status);
            return Err(GenError::Inference {
                model: self.model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        log::debug!("Image payload size: {} bytes", text.len());
        Ok(text)
    }
}
