//! Hand-off of validated contacts to the email relay

pub mod adapter;
pub mod emailjs;
pub mod relay;

pub use adapter::{ConfigIssue, DispatchAdapter};
pub use emailjs::EmailJsClient;
pub use relay::{EmailRelay, RelayError, RelayRequest, RelayResponse};

use serde::Serialize;

/// Classified result of one relay call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Success { id: String },
    TransientFailure { cause: String },
    PermanentFailure { cause: String },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DispatchOutcome::TransientFailure { .. })
    }
}
