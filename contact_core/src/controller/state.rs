//! Visible submission states and the outcomes that drive them

use crate::models::FieldError;
use crate::spam::RejectionReason;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str =
    "Thank you for contacting us. We'll respond within 24 hours.";
pub const VALIDATION_MESSAGE: &str = "Please correct the highlighted fields and try again.";
/// Shared by every guard rejection so the cause cannot be inferred.
pub const NOT_ACCEPTED_MESSAGE: &str =
    "We couldn't accept your message right now. Please wait a moment before trying again.";
pub const TRANSIENT_FAILURE_MESSAGE: &str =
    "Failed to send message. Please try again in a few minutes.";
pub const PERMANENT_FAILURE_MESSAGE: &str =
    "Our contact form is unavailable right now. Please call us directly or send us an email.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub kind: FailureKind,
    /// Internal detail for logs; never shown to the visitor.
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { dispatch_id: String },
    RejectedAsSpam { reason: RejectionReason },
    ValidationFailed { errors: Vec<FieldError> },
    DispatchFailed { reason: DispatchFailure },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success { .. } => SUCCESS_MESSAGE,
            SubmissionOutcome::ValidationFailed { .. } => VALIDATION_MESSAGE,
            SubmissionOutcome::RejectedAsSpam { .. } => NOT_ACCEPTED_MESSAGE,
            SubmissionOutcome::DispatchFailed { reason } => match reason.kind {
                FailureKind::Transient => TRANSIENT_FAILURE_MESSAGE,
                FailureKind::Permanent => PERMANENT_FAILURE_MESSAGE,
            },
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            SubmissionOutcome::ValidationFailed { errors } => errors,
            _ => &[],
        }
    }

    pub(crate) fn to_state(&self) -> SubmissionState {
        match self {
            SubmissionOutcome::Success { dispatch_id } => SubmissionState::Success {
                dispatch_id: dispatch_id.clone(),
            },
            other => SubmissionState::Error {
                message: other.user_message().to_string(),
                field_errors: other.field_errors().to_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success {
        dispatch_id: String,
    },
    Error {
        message: String,
        field_errors: Vec<FieldError>,
    },
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Success { .. } | SubmissionState::Error { .. })
    }
}
