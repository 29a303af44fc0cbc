use crate::{
    error::{GenError, Result},
    models::TextGenerationRequest,
    torchserve::traits::TextBackend,
};
use async_trait::async_trait;
use reqwest::{header, Client};

#[derive(Clone)]
pub struct TextClient {
    client: Client,
    url: String,
    model: String,
}

impl TextClient {
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
impl TextBackend for TextClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &TextGenerationRequest) -> Result<String> {
        let body = serde_json::to_string(request)?;

        log::info!("Invoking text model: {}", self.model);
        log::debug!("Text generation request payload: {}", body);

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::error!("Text model {} returned {}: {}", self.model, status, body);
            return Err(GenError::Inference {
                model: self.model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        log::debug!("Text model response: {}", text);
        Ok(text)
    }
}
