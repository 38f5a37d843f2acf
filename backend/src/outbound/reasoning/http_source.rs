//! Reqwest-backed reasoning adapter for Azure OpenAI chat completions.
//!
//! This adapter owns transport details only: prompt serialisation, the
//! `api-key` header, timeout and HTTP error mapping, and decoding the model's
//! JSON answer into mappings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;
use zeroize::Zeroizing;

use super::dto::{
    ChatCompletionRequestDto, ChatCompletionResponseDto, ChatMessageDto, MappingsPayloadDto,
    ResponseFormatDto,
};
use super::prompt::{system_prompt, user_prompt};
use crate::domain::TargetMapping;
use crate::domain::ports::{
    ReasoningRequest, ReasoningResponse, ReasoningSource, ReasoningSourceError,
};

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
const TEMPERATURE: f32 = 0.3;

/// Connection settings for one Azure OpenAI deployment.
pub struct AzureReasoningConfig {
    /// Resource endpoint, e.g. `https://example.openai.azure.com/`.
    pub endpoint: Url,
    pub deployment: String,
    pub api_version: String,
    pub api_key: Zeroizing<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

/// Reasoning source that calls one chat-completions deployment.
pub struct AzureReasoningSource {
    client: Client,
    url: Url,
    api_key: Zeroizing<String>,
}

impl AzureReasoningSource {
    /// Build an adapter with a reqwest client bounded by `config.timeout`.
    /// ```rust,ignore
    /// let source = AzureReasoningSource::new(config)?;
    /// ```
    /// # Errors
    ///
    /// Returns [`ReasoningSourceError::InvalidRequest`] when the deployment
    /// URL cannot be formed or the client cannot be constructed.
    pub fn new(config: AzureReasoningConfig) -> Result<Self, ReasoningSourceError> {
        let url = completions_url(&config.endpoint, &config.deployment, &config.api_version)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ReasoningSourceError::invalid_request(err.to_string()))?;
        Ok(Self {
            client,
            url,
            api_key: config.api_key,
        })
    }
}

fn completions_url(
    endpoint: &Url,
    deployment: &str,
    api_version: &str,
) -> Result<Url, ReasoningSourceError> {
    let deployment = deployment.trim();
    if deployment.is_empty() || deployment.contains('/') {
        return Err(ReasoningSourceError::invalid_request(
            "deployment must be a single non-empty path segment",
        ));
    }
    let mut url = endpoint
        .join(&format!("openai/deployments/{deployment}/chat/completions"))
        .map_err(|err| ReasoningSourceError::invalid_request(err.to_string()))?;
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

#[async_trait]
impl ReasoningSource for AzureReasoningSource {
    async fn resolve(
        &self,
        request: &ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningSourceError> {
        let system = system_prompt();
        let user = user_prompt(request)?;
        let body = ChatCompletionRequestDto {
            messages: vec![
                ChatMessageDto {
                    role: "system",
                    content: &system,
                },
                ChatMessageDto {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormatDto::json_object(),
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }

        let mappings = parse_mappings(bytes.as_ref())?;
        Ok(ReasoningResponse { mappings })
    }
}

fn parse_mappings(body: &[u8]) -> Result<Vec<TargetMapping>, ReasoningSourceError> {
    let decoded: ChatCompletionResponseDto = serde_json::from_slice(body).map_err(|error| {
        ReasoningSourceError::decode(format!("invalid chat completion payload: {error}"))
    })?;
    let content = decoded
        .into_content()
        .ok_or_else(|| ReasoningSourceError::decode("completion has no content"))?;
    let payload: MappingsPayloadDto = serde_json::from_str(strip_code_fence(&content))
        .map_err(|error| ReasoningSourceError::decode(format!("invalid mappings JSON: {error}")))?;
    Ok(payload.into_mappings())
}

/// Models sometimes wrap JSON in a Markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn map_transport_error(error: reqwest::Error) -> ReasoningSourceError {
    if error.is_timeout() {
        ReasoningSourceError::timeout(error.to_string())
    } else {
        ReasoningSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ReasoningSourceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => ReasoningSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ReasoningSourceError::timeout(message)
        }
        _ if status.is_client_error() => ReasoningSourceError::invalid_request(message),
        _ => ReasoningSourceError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
