use thiserror::Error;

use crate::provider::ProviderId;

/// Why a provider call produced no usable data.
///
/// The aggregation service never surfaces these to callers; each one is
/// replaced by fallback data for that provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to normalize {provider} response: {source}")]
    Normalize {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: ProviderId,
        operation: &'static str,
    },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderError::Request { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Normalize { provider, .. }
            | ProviderError::Unsupported { provider, .. } => *provider,
        }
    }
}

/// Failures above the per-provider fallback boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{provider} task did not complete: {source}")]
    TaskFailed {
        provider: ProviderId,
        #[source]
        source: tokio::task::JoinError,
    },
}
