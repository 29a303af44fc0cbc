pub mod decode;
pub mod fanout;
pub mod prompts;

use crate::{
    error::{GenError, Result},
    logger,
    models::{GeneratedImage, GenerationParameters},
    torchserve::{ImageBackend, InferenceClient, TextBackend},
};
use std::sync::Arc;

pub use decode::{decode_image, encode_pixel_array, to_png_data_uri};
pub use fanout::{generate_images, scatter_gather};
pub use prompts::{build_instruction, parse_prompts, trim_prompt, PromptExpander};

/// Seed prompt in, captioned images out: prompt expansion, image fan-out, decoding.
#[derive(Clone)]
pub struct Pipeline {
    text: Arc<dyn TextBackend>,
    image: Arc<dyn ImageBackend>,
}

impl Pipeline {
    pub fn new(text: Arc<dyn TextBackend>, image: Arc<dyn ImageBackend>) -> Self {
        Self { text, image }
    }

    pub fn from_client(client: &InferenceClient) -> Self {
        Self::new(client.text_backend(), client.image_backend())
    }

    /// Returns exactly `params.images_num` images in prompt order, or an error and
    /// nothing at all.
    pub async fn run(
        &self,
        seed: &str,
        params: &GenerationParameters,
    ) -> Result<Vec<GeneratedImage>> {
        let seed = seed.trim();
        if seed.is_empty() {
            return Err(GenError::InvalidParameter("prompt must not be empty".into()));
        }
        params.validate()?;

        let _total = logger::timer("pipeline run");

        let prompts = {
            let _t = logger::timer("prompt expansion");
            PromptExpander::new(self.text.as_ref())
                .expand(seed, params)
                .await?
        };

        let payloads = {
            let _t = logger::timer("image generation");
            generate_images(self.image.as_ref(), &prompts, params).await?
        };

        let images = prompts
            .into_inner()
            .into_iter()
            .zip(payloads.iter())
            .map(|(caption, payload)| {
                decode_image(payload).map(|image| GeneratedImage::new(image, caption))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("Generated {} image(s) for prompt: {}", images.len(), seed);
        Ok(images)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{ImageGenerationRequest, TextGenerationRequest};
    use async_trait::async_trait;
    use image::{DynamicImage, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct FixedText(pub String);

    #[async_trait]
    impl TextBackend for FixedText {
        fn model_name(&self) -> &str {
            "fixed-text"
        }

        async fn generate(&self, _request: &TextGenerationRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    /// Returns a 2x2 image whose red channel encodes the request's position, and
    /// fails the request with index `fail_at`.
    pub struct CountingImages {
        pub calls: AtomicUsize,
        pub fail_at: Option<usize>,
    }

    impl CountingImages {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at: None,
            }
        }

        pub fn failing_at(index: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at: Some(index),
            }
        }
    }

    #[async_trait]
    impl ImageBackend for CountingImages {
        fn model_name(&self) -> &str {
            "counting-images"
        }

        async fn generate(&self, request: &ImageGenerationRequest) -> Result<String> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(index) {
                return Err(GenError::Inference {
                    model: "counting-images".into(),
                    status: 503,
                    body: format!("failed on {}", request.prompt),
                });
            }
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
                2,
                2,
                image::Rgb([index as u8, 0, 0]),
            ));
            Ok(encode_pixel_array(&image))
        }
    }

    pub fn pipeline(text_reply: &str, images: CountingImages) -> (Pipeline, Arc<CountingImages>) {
        let images = Arc::new(images);
        let pipeline = Pipeline::new(Arc::new(FixedText(text_reply.to_string())), images.clone());
        (pipeline, images)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_produces_one_image_per_prompt() {
        for n in 1..=4 {
            let (pipeline, _) = pipeline("a;b;c;d", CountingImages::new());
            let params = GenerationParameters::new().with_images_num(n);

            let images = pipeline.run("seed", &params).await.unwrap();

            assert_eq!(images.len(), n);
            assert_eq!(images[0].caption, "seed");
            if n > 1 {
                assert_eq!(images[1].caption, "a");
            }
        }
    }

    #[tokio::test]
    async fn test_insufficient_prompts_stop_before_images() {
        let (pipeline, images) = pipeline("just one", CountingImages::new());
        let params = GenerationParameters::new().with_images_num(3);

        let err = pipeline.run("seed", &params).await.unwrap_err();

        assert!(matches!(err, GenError::InsufficientPrompts { .. }));
        assert_eq!(images.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_seed_rejected() {
        let (pipeline, _) = pipeline("a;b", CountingImages::new());
        let err = pipeline
            .run("   ", &GenerationParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let (pipeline, _) = pipeline("a;b", CountingImages::new());
        let params = GenerationParameters::new().with_size(300, 768);
        let err = pipeline.run("seed", &params).await.unwrap_err();
        assert!(matches!(err, GenError::InvalidParameter(_)));
    }
}
