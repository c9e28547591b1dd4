//! Contact form validation: field rules, normalization and error collection

pub mod rules;
pub mod validators;

pub use rules::{format_phone_number, is_valid_email, is_valid_phone, phone_digits, sanitize_text};
pub use validators::{validate, ContactValidator, FIELD_ORDER};
