pub mod health;
pub mod image_client;
pub mod text_client;
pub mod traits;

use crate::{config::Config, error::Result};
use reqwest::Client;
use std::sync::Arc;

pub use health::HealthProber;
pub use image_client::ImageClient;
pub use text_client::TextClient;
pub use traits::{HealthCheck, ImageBackend, TextBackend};

/// All endpoints of one TorchServe host, sharing a single connection pool.
#[derive(Clone)]
pub struct InferenceClient {
    text_client: TextClient,
    image_client: ImageClient,
    prober: HealthProber,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            text_client: TextClient::new(client.clone(), &config.inference_url, &config.llm_model),
            image_client: ImageClient::new(
                client.clone(),
                &config.inference_url,
                &config.sd_model,
            ),
            prober: HealthProber::new(
                client,
                &config.inference_url,
                &config.management_url,
                &config.llm_model,
                &config.sd_model,
            ),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn health(&self) -> &HealthProber {
        &self.prober
    }

    pub fn text_backend(&self) -> Arc<dyn TextBackend> {
        Arc::new(self.text_client.clone())
    }

    pub fn image_backend(&self) -> Arc<dyn ImageBackend> {
        Arc::new(self.image_client.clone())
    }

    pub fn health_check(&self) -> Arc<dyn HealthCheck> {
        Arc::new(self.prober.clone())
    }
}
