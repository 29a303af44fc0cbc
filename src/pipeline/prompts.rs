//! Expands one seed prompt into a batch of related prompts using the text model.
//!
//! The model is asked for semicolon-separated prompts wrapped in square brackets.
//! Only the semicolons are relied on: brackets and any other punctuation at the
//! edges of a fragment are removed by [`trim_prompt`].

use crate::{
    error::{GenError, Result},
    models::{GenerationParameters, PromptBatch, TextGenerationRequest},
    torchserve::TextBackend,
};

pub const PROMPT_DELIMITER: char = ';';

pub fn build_instruction(seed: &str, count: usize) -> String {
    format!(
        "Generate {} different unique prompts similar to: {}. \
         Add semicolon between the prompts. \
         Generated string of prompts should be included in square brackets. E.g.:",
        count, seed
    )
}

/// Strips every leading and trailing character that is not an ASCII letter or digit.
pub fn trim_prompt(fragment: &str) -> &str {
    fragment.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}

/// Splits the raw model output into exactly `count` prompts, seed first.
///
/// Empty fragments are dropped and surplus fragments are discarded in emission
/// order. Fails with [`GenError::InsufficientPrompts`] instead of padding.
pub fn parse_prompts(raw: &str, seed: &str, count: usize) -> Result<PromptBatch> {
    let mut prompts: Vec<String> = Vec::with_capacity(count);
    prompts.push(seed.to_string());
    prompts.extend(
        raw.split(PROMPT_DELIMITER)
            .map(trim_prompt)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    );
    prompts.truncate(count);

    if prompts.len() < count {
        return Err(GenError::InsufficientPrompts {
            requested: count,
            produced: prompts.len(),
        });
    }

    Ok(PromptBatch::from_vec(prompts))
}

pub struct PromptExpander<'a> {
    backend: &'a dyn TextBackend,
}

impl<'a> PromptExpander<'a> {
    pub fn new(backend: &'a dyn TextBackend) -> Self {
        Self { backend }
    }

    /// A single image never reaches the text model.
    pub async fn expand(&self, seed: &str, params: &GenerationParameters) -> Result<PromptBatch> {
        let count = params.images_num;
        if count <= 1 {
            return Ok(PromptBatch::single(seed));
        }

        let request = TextGenerationRequest::new(build_instruction(seed, count), params);
        let raw = self.backend.generate(&request).await?;

        let batch = parse_prompts(&raw, seed, count)?;
        log::info!("Expanded prompt into {} prompts: {:?}", batch.len(), batch.as_slice());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedText {
        reply: String,
        seen: Mutex<Vec<TextGenerationRequest>>,
    }

    impl CannedText {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextBackend for CannedText {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: &TextGenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn batch(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_drops_blank_fragments() {
        let prompts = parse_prompts("a cat;  ;b dog; ", "animal", 3).unwrap();
        assert_eq!(prompts.into_inner(), batch(&["animal", "a cat", "b dog"]));
    }

    #[test]
    fn test_trims_non_alphanumeric_edges() {
        let prompts = parse_prompts(
            "[\"A red fox at dawn\"; 'misty forest, oil painting!'];",
            "fox",
            3,
        )
        .unwrap();
        assert_eq!(
            prompts.into_inner(),
            batch(&["fox", "A red fox at dawn", "misty forest, oil painting"])
        );
    }

    #[test]
    fn test_inner_punctuation_is_kept() {
        assert_eq!(trim_prompt("  --a cat's hat, 4k--  "), "a cat's hat, 4k");
        assert_eq!(trim_prompt("...!!!"), "");
        // Non-ASCII letters are not alphanumeric for trimming purposes.
        assert_eq!(trim_prompt("émile"), "mile");
    }

    #[test]
    fn test_too_few_prompts() {
        let err = parse_prompts("only one;  ; ", "seed", 3).unwrap_err();
        assert!(matches!(
            err,
            GenError::InsufficientPrompts {
                requested: 3,
                produced: 2
            }
        ));
    }

    #[test]
    fn test_excess_fragments_discarded_in_order() {
        let prompts = parse_prompts("one;two;three;four;five", "seed", 4).unwrap();
        assert_eq!(prompts.into_inner(), batch(&["seed", "one", "two", "three"]));
    }

    #[test]
    fn test_brackets_not_required() {
        let prompts = parse_prompts("no brackets here", "seed", 2).unwrap();
        assert_eq!(prompts.into_inner(), batch(&["seed", "no brackets here"]));
    }

    #[test]
    fn test_instruction_text() {
        let instruction = build_instruction("a lighthouse", 3);
        assert_eq!(
            instruction,
            "Generate 3 different unique prompts similar to: a lighthouse. \
             Add semicolon between the prompts. \
             Generated string of prompts should be included in square brackets. E.g.:"
        );
    }

    #[tokio::test]
    async fn test_single_image_skips_text_model() {
        let backend = CannedText::new("ignored;ignored");
        let params = GenerationParameters::new().with_images_num(1);

        let prompts = PromptExpander::new(&backend)
            .expand("a lighthouse", &params)
            .await
            .unwrap();

        assert_eq!(prompts.into_inner(), batch(&["a lighthouse"]));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expand_sends_sampling_parameters() {
        let backend = CannedText::new("[stormy sea; calm harbor; night pier]");
        let params = GenerationParameters::new()
            .with_images_num(3)
            .with_sampling(120, 1.2, 40);

        let prompts = PromptExpander::new(&backend)
            .expand("a lighthouse", &params)
            .await
            .unwrap();

        assert_eq!(
            prompts.into_inner(),
            batch(&["a lighthouse", "stormy sea", "calm harbor"])
        );

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].max_new_tokens, 120);
        assert_eq!(seen[0].temperature, 1.2);
        assert_eq!(seen[0].top_k, 40);
        assert!(seen[0].prompt.starts_with("Generate 3 different unique prompts"));
    }
}
