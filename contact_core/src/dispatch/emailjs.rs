//! HTTP client for the EmailJS REST API

use super::relay::{EmailRelay, RelayError, RelayRequest, RelayResponse};
use crate::config::RelayConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const SEND_PATH: &str = "/api/v1.0/email/send";

#[derive(Debug, Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a BTreeMap<String, String>,
}

impl EmailJsClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RelayError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.api_url.trim_end_matches('/'), SEND_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn map_transport_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout
    } else if err.is_builder() {
        RelayError::InvalidRequest(err.to_string())
    } else {
        RelayError::Network(err.to_string())
    }
}

#[async_trait]
impl EmailRelay for EmailJsClient {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        let body = SendBody {
            service_id: &request.service_id,
            template_id: &request.template_id,
            user_id: &request.public_key,
            access_token: request.access_token.as_deref(),
            template_params: &request.template_params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        debug!(status, text = %text, "Relay responded");

        Ok(RelayResponse { status, text })
    }
}
