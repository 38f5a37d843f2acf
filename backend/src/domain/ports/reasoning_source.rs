//! Driven port for the external reasoning (LLM) call.
//!
//! The domain owns the request and response shapes; the HTTP adapter turns
//! them into a chat-completion exchange.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ReferenceData, TargetMapping};

/// Input sent to the reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    /// Every mapping after deterministic rules, in request order.
    pub mappings: Vec<TargetMapping>,
    /// Labels of the free-text fields the service should resolve.
    pub unresolved_fields: Vec<String>,
    /// Filtered reference rows available as context.
    pub reference_data: ReferenceData,
}

/// Mappings proposed by the reasoning service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReasoningResponse {
    pub mappings: Vec<TargetMapping>,
}

define_port_error! {
    /// Errors surfaced while calling the reasoning service.
    pub enum ReasoningSourceError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "reasoning transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "reasoning call timed out: {message}",
        /// The service rate-limited the request.
        RateLimited { message: String } =>
            "reasoning service rate limited request: {message}",
        /// The response could not be decoded into mappings.
        Decode { message: String } =>
            "reasoning response decode failed: {message}",
        /// The service or adapter rejected the request.
        InvalidRequest { message: String } =>
            "reasoning request invalid: {message}",
    }
}

impl ReasoningSourceError {
    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Port for resolving free-text fields against reference context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningSource: Send + Sync {
    async fn resolve(
        &self,
        request: &ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningSourceError>;
}

/// Fixture that echoes the submitted mappings unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureReasoningSource;

#[async_trait]
impl ReasoningSource for FixtureReasoningSource {
    async fn resolve(
        &self,
        request: &ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningSourceError> {
        Ok(ReasoningResponse {
            mappings: request.mappings.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReasoningSourceError::transport("reset"), true)]
    #[case(ReasoningSourceError::timeout("30s"), true)]
    #[case(ReasoningSourceError::rate_limited("429"), true)]
    #[case(ReasoningSourceError::decode("not json"), false)]
    #[case(ReasoningSourceError::invalid_request("400"), false)]
    fn classifies_retryable_errors(#[case] error: ReasoningSourceError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[tokio::test]
    async fn fixture_echoes_mappings() {
        let request = ReasoningRequest {
            mappings: vec![TargetMapping::new("Fabric Weight", "180 gsm")],
            unresolved_fields: vec!["Fabric Weight".to_owned()],
            reference_data: ReferenceData::default(),
        };
        let response = FixtureReasoningSource
            .resolve(&request)
            .await
            .expect("fixture succeeds");
        assert_eq!(response.mappings, request.mappings);
    }
}
