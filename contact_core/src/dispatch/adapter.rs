//! Translates validated contacts into relay calls and classifies the results

use super::relay::{EmailRelay, RelayError, RelayRequest, RelayResponse};
use super::DispatchOutcome;
use crate::config::{BusinessConfig, RelayConfig};
use crate::models::{ContactFormInput, ValidatedContact};
use crate::validation::{self, format_phone_number};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

const SUBMISSION_DATE_FORMAT: &str = "%B %-d, %Y at %I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relay configuration is incomplete: missing {}", .missing.join(", "))]
pub struct ConfigIssue {
    pub missing: Vec<&'static str>,
}

pub struct DispatchAdapter {
    relay: Arc<dyn EmailRelay>,
    relay_config: RelayConfig,
    business: BusinessConfig,
}

impl DispatchAdapter {
    pub fn new(relay: Arc<dyn EmailRelay>, relay_config: RelayConfig, business: BusinessConfig) -> Self {
        Self {
            relay,
            relay_config,
            business,
        }
    }

    pub fn business(&self) -> &BusinessConfig {
        &self.business
    }

    pub fn check_config(&self) -> Result<(), ConfigIssue> {
        let missing = self.relay_config.missing_settings();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigIssue { missing })
        }
    }

    pub fn submission_date(&self, submitted_at: DateTime<Utc>) -> String {
        let offset = FixedOffset::east_opt(self.business.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());

        submitted_at
            .with_timezone(&offset)
            .format(SUBMISSION_DATE_FORMAT)
            .to_string()
    }

    pub fn template_params(
        &self,
        contact: &ValidatedContact,
        submitted_at: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let service = contact.service().label();
        let business = &self.business;

        let entries = [
            ("from_name", contact.name().to_string()),
            ("from_email", contact.email().to_string()),
            ("from_phone", format_phone_number(contact.phone())),
            ("service_interest", service.to_string()),
            ("message", contact.message().to_string()),
            ("to_name", business.recipient_name.clone()),
            ("to_email", business.recipient_email.clone()),
            ("subject", format!("New Contact Form Submission - {}", service)),
            ("submission_date", self.submission_date(submitted_at)),
            ("reply_to", contact.email().to_string()),
            ("business_name", business.business_name.clone()),
            ("business_phone", business.business_phone.clone()),
            ("business_email", business.business_email.clone()),
        ];

        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    fn build_request(&self, contact: &ValidatedContact, submitted_at: DateTime<Utc>) -> RelayRequest {
        RelayRequest {
            service_id: self.relay_config.service_id.trim().to_string(),
            template_id: self.relay_config.template_id.trim().to_string(),
            public_key: self.relay_config.public_key.trim().to_string(),
            access_token: self
                .relay_config
                .private_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            template_params: self.template_params(contact, submitted_at),
        }
    }

    pub async fn send(&self, contact: &ValidatedContact) -> DispatchOutcome {
        self.send_at(contact, Utc::now()).await
    }

    /// One relay call. Incomplete configuration fails permanently without touching the network.
    pub async fn send_at(&self, contact: &ValidatedContact, submitted_at: DateTime<Utc>) -> DispatchOutcome {
        if let Err(issue) = self.check_config() {
            error!(missing = ?issue.missing, "Refusing to dispatch: {}", issue);
            return DispatchOutcome::PermanentFailure {
                cause: issue.to_string(),
            };
        }

        let request = self.build_request(contact, submitted_at);

        match self.relay.send(&request).await {
            Ok(response) => classify_response(response),
            Err(err) => classify_error(err),
        }
    }

    /// Sends a fixed test inquiry to confirm the relay configuration works end to end.
    pub async fn send_test_message(&self) -> DispatchOutcome {
        let input = ContactFormInput::new(
            "Test User",
            "test@example.com",
            "(555) 123-4567",
            "consultation",
            "This is a test message to verify the contact form relay configuration.",
        );

        match validation::validate(&input) {
            Ok(contact) => {
                info!("Sending relay test message");
                self.send(&contact).await
            }
            Err(errors) => DispatchOutcome::PermanentFailure {
                cause: format!("test contact failed validation: {:?}", errors),
            },
        }
    }
}

fn classify_response(response: RelayResponse) -> DispatchOutcome {
    if response.is_success() {
        let id = Uuid::new_v4().to_string();
        info!(dispatch_id = %id, status = response.status, "Contact message relayed");
        return DispatchOutcome::Success { id };
    }

    let cause = format!("relay responded with status {}: {}", response.status, response.text);

    match response.status {
        408 | 429 | 500..=599 => {
            warn!(status = response.status, "Relay reported a transient failure");
            DispatchOutcome::TransientFailure { cause }
        }
        _ => {
            error!(status = response.status, "Relay rejected the message");
            DispatchOutcome::PermanentFailure { cause }
        }
    }
}

fn classify_error(err: RelayError) -> DispatchOutcome {
    match err {
        RelayError::Timeout | RelayError::Network(_) => {
            warn!(error = %err, "Relay call failed");
            DispatchOutcome::TransientFailure {
                cause: err.to_string(),
            }
        }
        RelayError::InvalidRequest(_) => {
            error!(error = %err, "Relay call could not be built");
            DispatchOutcome::PermanentFailure {
                cause: err.to_string(),
            }
        }
    }
}
