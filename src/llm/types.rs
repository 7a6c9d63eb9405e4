use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
    ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    ImageDetail as OpenAiImageDetail, ImageUrl,
};
use serde::{Deserialize, Serialize};

/// Fidelity hint for an attached image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        url: String,
        detail: Option<ImageDetail>,
    },
}

/// A single user turn. Every exchange with a provider is one multimodal
/// prompt, so no other roles exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u16>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Choice {
    pub index: u32,
    pub content: Option<String>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        Self::ImageUrl {
            url: url.into(),
            detail,
        }
    }

    fn to_openai_part(&self) -> ChatCompletionRequestUserMessageContentPart {
        match self {
            Self::Text { text } => ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText { text: text.clone() },
            ),
            Self::ImageUrl { url, detail } => {
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: detail.map(ImageDetail::to_openai),
                        },
                    },
                )
            }
        }
    }
}

impl ImageDetail {
    fn to_openai(self) -> OpenAiImageDetail {
        match self {
            Self::Auto => OpenAiImageDetail::Auto,
            Self::Low => OpenAiImageDetail::Low,
            Self::High => OpenAiImageDetail::High,
        }
    }
}

impl ChatMessage {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self { content }
    }

    /// Concatenated text parts, ignoring images.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_urls(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ImageUrl { url, .. } => Some(url.as_str()),
                ContentPart::Text { .. } => None,
            })
            .collect()
    }

    pub fn to_openai_message(&self) -> Result<ChatCompletionRequestMessage, crate::Error> {
        let parts = self.content.iter().map(ContentPart::to_openai_part).collect();
        let msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(parts))
            .build()
            .map_err(|e| crate::Error::llm(format!("Failed to build user message: {}", e)))?;
        Ok(msg.into())
    }
}

impl ChatCompletionResponse {
    /// Returns the trimmed text of the first choice, rejecting responses that
    /// lack it.
    pub fn completion_text(&self) -> crate::Result<&str> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| crate::Error::malformed("response contains no choices"))?;

        let content = choice
            .content
            .as_deref()
            .ok_or_else(|| crate::Error::malformed("first choice has no message content"))?
            .trim();

        if content.is_empty() {
            return Err(crate::Error::malformed("first choice has empty message content"));
        }

        Ok(content)
    }
}
