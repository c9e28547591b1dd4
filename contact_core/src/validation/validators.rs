//! Contact form validator

use super::rules::*;
use crate::models::{ContactFormInput, FieldError, ServiceInterest, ValidatedContact};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Form fields in the order they appear on the page. Errors are reported in this order.
pub const FIELD_ORDER: [&str; 5] = ["name", "email", "phone", "serviceInterest", "message"];

/// Normalized copy of the visible form fields, ready for rule checks.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactValidator {
    #[validate(custom(function = "validate_name", message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_email", message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(custom(function = "validate_phone", message = "Please enter a valid 10-digit phone number"))]
    pub phone: String,

    #[validate(custom(function = "validate_service_interest", message = "Please select a service"))]
    pub service_interest: String,

    #[validate(custom(function = "validate_message", message = "Message must be at least 10 characters"))]
    pub message: String,
}

impl ContactValidator {
    /// Trims every field and strips markup from the free-text ones. The honeypot is not copied.
    pub fn from_input(input: &ContactFormInput) -> Self {
        Self {
            name: sanitize_text(&input.name),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            service_interest: input.service_interest.trim().to_string(),
            message: sanitize_text(&input.message),
        }
    }

    pub fn into_validated(self) -> Result<ValidatedContact, Vec<FieldError>> {
        if let Err(errors) = self.validate() {
            return Err(field_errors(&errors));
        }

        let Some(service) = ServiceInterest::from_slug(&self.service_interest) else {
            return Err(vec![FieldError::new("serviceInterest", default_message("serviceInterest"))]);
        };

        Ok(ValidatedContact::new(
            self.name,
            self.email,
            phone_digits(&self.phone),
            service,
            self.message,
        ))
    }
}

/// Checks every field of the form and reports all failures together.
pub fn validate(input: &ContactFormInput) -> Result<ValidatedContact, Vec<FieldError>> {
    ContactValidator::from_input(input).into_validated()
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let field = wire_name(&field.to_string());
            let message = field_errors
                .first()
                .and_then(|error| error.message.as_ref())
                .map(|message| message.to_string())
                .unwrap_or_else(|| default_message(&field).to_string());
            FieldError::new(field, message)
        })
        .collect();

    collected.sort_by_key(|error| {
        FIELD_ORDER
            .iter()
            .position(|field| *field == error.field)
            .unwrap_or(FIELD_ORDER.len())
    });

    collected
}

fn wire_name(field: &str) -> String {
    match field {
        "service_interest" => "serviceInterest".to_string(),
        other => other.to_string(),
    }
}

fn default_message(field: &str) -> &'static str {
    match field {
        "name" => "Name must be at least 2 characters",
        "email" => "Please enter a valid email address",
        "phone" => "Please enter a valid 10-digit phone number",
        "serviceInterest" => "Please select a service",
        "message" => "Message must be at least 10 characters",
        _ => "Invalid value",
    }
}
