//! Contract with the external email relay

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Everything the relay needs for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayRequest {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub access_token: Option<String>,
    pub template_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub text: String,
}

impl RelayResponse {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures raised before the relay produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay request timed out")]
    Timeout,

    #[error("relay network error: {0}")]
    Network(String),

    #[error("invalid relay request: {0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait EmailRelay: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, RelayError>;
}
