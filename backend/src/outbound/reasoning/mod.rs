//! Reasoning outbound adapters.
//!
//! This module provides an HTTP implementation of the `ReasoningSource` port
//! backed by an Azure OpenAI chat-completions deployment.

mod dto;
mod http_source;
mod prompt;

pub use http_source::{AzureReasoningConfig, AzureReasoningSource, DEFAULT_API_VERSION};
