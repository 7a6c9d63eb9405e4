use super::{format, prompts};
use crate::{
    Error, Result,
    config::{ImageDelivery, RecognitionConfig},
    llm::{ChatCompletionRequest, ChatMessage, ContentPart, ImageDetail, LlmClient},
    store::{ImagePayload, ImageStore},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates recognition, solving and explanation requests against the
/// hosted vision and language models.
pub struct MathSolver {
    vision: Arc<dyn LlmClient>,
    language: Arc<dyn LlmClient>,
    store: Arc<ImageStore>,
    recognition: RecognitionConfig,
}

impl MathSolver {
    pub fn new(
        vision: Arc<dyn LlmClient>,
        language: Arc<dyn LlmClient>,
        store: Arc<ImageStore>,
        recognition: RecognitionConfig,
    ) -> Self {
        Self {
            vision,
            language,
            store,
            recognition,
        }
    }

    /// Reads the handwritten expression, truncated to the configured
    /// character budget.
    pub async fn recognize(&self, image: &ImagePayload) -> Result<String> {
        let image_url = match self.recognition.image_delivery {
            ImageDelivery::Inline => image.data_url(),
            ImageDelivery::Url => {
                let stored = self.store.save_payload(image).await?;
                info!("Image saved at: {}", stored.url);
                stored.url
            }
        };

        let request = ChatCompletionRequest {
            messages: vec![ChatMessage::user(vec![
                ContentPart::text(prompts::recognition_prompt(self.recognition.max_chars)),
                ContentPart::image(image_url, None),
            ])],
            max_tokens: Some(self.recognition.max_tokens),
            temperature: Some(self.recognition.temperature),
        };

        let response = self.vision.create_chat_completion(request).await?;
        let text = response.completion_text()?;
        debug!("Recognized raw text: {}", text);

        Ok(format::truncate_chars(text, self.recognition.max_chars))
    }

    /// Asks for the bare final answer of `expression`, with the drawing
    /// attached as context.
    pub async fn solve(&self, image: &ImagePayload, expression: &str) -> Result<String> {
        info!("Solving expression: {}", expression);

        let request = ChatCompletionRequest {
            messages: vec![ChatMessage::user(vec![
                ContentPart::text(prompts::solve_prompt(expression)),
                ContentPart::image(image.data_url(), Some(ImageDetail::High)),
            ])],
            max_tokens: None,
            temperature: None,
        };

        let response = self.language.create_chat_completion(request).await?;
        Ok(response.completion_text()?.to_string())
    }

    /// Returns the worked solution as a single formatted block.
    pub async fn explain(&self, image: &ImagePayload) -> Result<Vec<String>> {
        let request = ChatCompletionRequest {
            messages: vec![ChatMessage::user(vec![
                ContentPart::text(prompts::EXPLAIN_PROMPT),
                ContentPart::image(image.data_url(), Some(ImageDetail::High)),
            ])],
            max_tokens: None,
            temperature: None,
        };

        let response = self.language.create_chat_completion(request).await?;
        let steps = format::normalize_steps(response.completion_text()?);
        if steps.is_empty() {
            return Err(Error::malformed("solution is empty after formatting"));
        }

        Ok(vec![steps])
    }
}
