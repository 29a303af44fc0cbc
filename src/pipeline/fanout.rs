use crate::{
    error::Result,
    models::{GenerationParameters, ImageGenerationRequest, PromptBatch},
    torchserve::ImageBackend,
};
use futures::future::try_join_all;
use std::future::Future;

/// Starts one future per item, waits for all of them and returns the outputs in
/// input order. The first error is returned as soon as it happens; futures still
/// in flight at that point are dropped.
pub async fn scatter_gather<I, F, Fut, T>(items: I, task: F) -> Result<Vec<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    try_join_all(items.into_iter().map(task)).await
}

/// Requests one image per prompt concurrently. The returned payloads line up
/// index-for-index with `prompts`.
pub async fn generate_images(
    backend: &dyn ImageBackend,
    prompts: &PromptBatch,
    params: &GenerationParameters,
) -> Result<Vec<String>> {
    log::info!(
        "Dispatching {} request(s) to image model {}",
        prompts.len(),
        backend.model_name()
    );

    scatter_gather(prompts, |prompt| {
        let request = ImageGenerationRequest::new(prompt.as_str(), params);
        async move { backend.generate(&request).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Echoes the prompt back after a per-prompt delay, optionally failing one prompt.
    struct DelayedEcho {
        delays_ms: Vec<(String, u64)>,
        fail_on: Option<String>,
        started: AtomicUsize,
    }

    impl DelayedEcho {
        fn new(delays_ms: &[(&str, u64)]) -> Self {
            Self {
                delays_ms: delays_ms
                    .iter()
                    .map(|(p, d)| (p.to_string(), *d))
                    .collect(),
                fail_on: None,
                started: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, prompt: &str) -> Self {
            self.fail_on = Some(prompt.to_string());
            self
        }

        fn batch(&self) -> PromptBatch {
            PromptBatch::from_vec(self.delays_ms.iter().map(|(p, _)| p.clone()).collect())
        }
    }

    #[async_trait]
    impl ImageBackend for DelayedEcho {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &ImageGenerationRequest) -> Result<String> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let delay = self
                .delays_ms
                .iter()
                .find(|(p, _)| *p == request.prompt)
                .map(|(_, d)| *d)
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_on.as_deref() == Some(request.prompt.as_str()) {
                return Err(GenError::Inference {
                    model: "echo".into(),
                    status: 500,
                    body: "worker died".into(),
                });
            }
            Ok(format!("payload:{}", request.prompt))
        }
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let backend = DelayedEcho::new(&[
            ("first", 120),
            ("second", 10),
            ("third", 60),
            ("fourth", 0),
        ]);
        let params = GenerationParameters::default();

        let payloads = generate_images(&backend, &backend.batch(), &params)
            .await
            .unwrap();

        assert_eq!(
            payloads,
            vec![
                "payload:first",
                "payload:second",
                "payload:third",
                "payload:fourth"
            ]
        );
    }

    #[tokio::test]
    async fn test_requests_run_concurrently() {
        let backend = DelayedEcho::new(&[("a", 200), ("b", 200), ("c", 200), ("d", 200)]);
        let params = GenerationParameters::default();

        let start = Instant::now();
        generate_images(&backend, &backend.batch(), &params)
            .await
            .unwrap();

        assert_eq!(backend.started.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_batch() {
        let backend = DelayedEcho::new(&[("a", 500), ("b", 500), ("c", 20), ("d", 500)])
            .failing_on("c");
        let params = GenerationParameters::default();

        let start = Instant::now();
        let err = generate_images(&backend, &backend.batch(), &params)
            .await
            .unwrap_err();

        assert!(matches!(err, GenError::Inference { status: 500, .. }));
        assert_eq!(backend.started.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_scatter_gather_passes_items_through() {
        let squares = scatter_gather(vec![3u64, 1, 2], |n| async move {
            tokio::time::sleep(Duration::from_millis(n * 10)).await;
            Ok(n * n)
        })
        .await
        .unwrap();
        assert_eq!(squares, vec![9, 1, 4]);
    }
}
