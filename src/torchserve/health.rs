use crate::{
    error::{GenError, Result},
    models::{HealthReport, ModelStatus},
    torchserve::traits::HealthCheck,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks the liveness of the inference host and the worker status of both models.
#[derive(Clone)]
pub struct HealthProber {
    client: Client,
    inference_url: String,
    management_url: String,
    text_model: String,
    image_model: String,
}

impl HealthProber {
    pub fn new(
        client: Client,
        inference_url: &str,
        management_url: &str,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            inference_url: inference_url.to_string(),
            management_url: management_url.to_string(),
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }

    async fn try_probe(&self) -> Result<HealthReport> {
        self.ping().await?;

        let image_status = self.model_status(&self.image_model).await?;
        let text_status = self.model_status(&self.text_model).await?;

        Ok(HealthReport {
            text_model: self.text_model.clone(),
            text_status,
            image_model: self.image_model.clone(),
            image_status,
        })
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/ping", self.inference_url);
        let response = self
            .client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| GenError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            log::warn!("Ping returned {}", response.status());
        }
        Ok(())
    }

    async fn model_status(&self, model: &str) -> Result<ModelStatus> {
        let url = format!("{}/models/{}", self.management_url, model);
        let response = self
            .client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| GenError::Connectivity(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            log::warn!("Status lookup for {} returned {}", model, response.status());
            return Ok(ModelStatus::NotReady);
        }

        match response.text().await {
            Ok(body) => Ok(parse_worker_status(&body)),
            Err(e) => {
                log::warn!("Could not read status of {}: {}", model, e);
                Ok(ModelStatus::NotReady)
            }
        }
    }
}

#[async_trait]
impl HealthCheck for HealthProber {
    /// Never fails: a transport failure anywhere marks the whole host unreachable.
    async fn probe(&self) -> HealthReport {
        match self.try_probe().await {
            Ok(report) => {
                log::debug!(
                    "Health: {}={}, {}={}",
                    report.text_model,
                    report.text_status,
                    report.image_model,
                    report.image_status
                );
                report
            }
            Err(e) => {
                log::warn!("⚠️  TorchServe is not up: {}", e);
                HealthReport::unreachable(&self.text_model, &self.image_model)
            }
        }
    }
}

/// Reads `[0].workers[0].status` from a model description.
pub fn parse_worker_status(body: &str) -> ModelStatus {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return ModelStatus::NotReady,
    };

    let status = value
        .get(0)
        .and_then(|model| model.get("workers"))
        .and_then(|workers| workers.get(0))
        .and_then(|worker| worker.get("status"))
        .and_then(Value::as_str);

    match status {
        Some("READY") => ModelStatus::Ready,
        _ => ModelStatus::NotReady,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_worker() {
        let body = r#"[{"modelName": "sdxl", "workers": [{"id": "9000", "status": "READY"}]}]"#;
        assert_eq!(parse_worker_status(body), ModelStatus::Ready);
    }

    #[test]
    fn test_only_first_worker_counts() {
        let body = r#"[{"workers": [{"status": "UNLOADING"}, {"status": "READY"}]}]"#;
        assert_eq!(parse_worker_status(body), ModelStatus::NotReady);
    }

    #[test]
    fn test_malformed_bodies_are_not_ready() {
        for body in [
            "",
            "not json",
            "{}",
            "[]",
            r#"[{"workers": []}]"#,
            r#"[{"workers": [{"status": 1}]}]"#,
            r#"[{"workers": [{"status": "ready"}]}]"#,
        ] {
            assert_eq!(parse_worker_status(body), ModelStatus::NotReady, "{}", body);
        }
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let prober = HealthProber::new(
            Client::new(),
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            "llama",
            "sdxl",
        );
        let report = prober.probe().await;
        assert_eq!(report, HealthReport::unreachable("llama", "sdxl"));
    }
}
