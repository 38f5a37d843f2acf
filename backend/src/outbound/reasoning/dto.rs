//! Wire types for the chat-completions exchange.

use serde::{Deserialize, Serialize};

use crate::domain::TargetMapping;

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequestDto<'a> {
    pub messages: Vec<ChatMessageDto<'a>>,
    pub temperature: f32,
    pub response_format: ResponseFormatDto,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ResponseFormatDto {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormatDto {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponseDto {
    #[serde(default)]
    pub choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceDto {
    pub message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceMessageDto {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponseDto {
    /// Text of the first choice, if the model produced any.
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

/// Shapes the model is allowed to answer with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum MappingsPayloadDto {
    Wrapped { target_mappings: Vec<TargetMapping> },
    Bare(Vec<TargetMapping>),
}

impl MappingsPayloadDto {
    pub fn into_mappings(self) -> Vec<TargetMapping> {
        match self {
            Self::Wrapped { target_mappings } | Self::Bare(target_mappings) => target_mappings,
        }
    }
}
