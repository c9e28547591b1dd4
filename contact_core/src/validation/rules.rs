//! Field rules for the contact form and the text helpers they rely on

use crate::models::ServiceInterest;
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_MESSAGE_LENGTH: usize = 10;
pub const PHONE_DIGIT_COUNT: usize = 10;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    static ref NANP_PHONE_REGEX: Regex = Regex::new(
        r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$"
    ).unwrap();

    static ref SCRIPT_BLOCK_REGEX: Regex = Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").unwrap();

    static ref HTML_TAG_REGEX: Regex = Regex::new(r"(?s)</?[a-zA-Z][^>]*>").unwrap();
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::new("name_too_short"));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email_required"));
    }

    if email.len() > 254 {
        return Err(ValidationError::new("email_too_long"));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::new("email_invalid"));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_digits(phone).len() != PHONE_DIGIT_COUNT {
        return Err(ValidationError::new("phone_invalid"));
    }

    Ok(())
}

pub fn validate_service_interest(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("service_required"));
    }

    if ServiceInterest::from_slug(value).is_none() {
        return Err(ValidationError::new("service_unknown"));
    }

    Ok(())
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().chars().count() < MIN_MESSAGE_LENGTH {
        return Err(ValidationError::new("message_too_short"));
    }

    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Strict shape check: `5201234567`, `(520) 123-4567`, `520-123-4567`, `520.123.4567`.
pub fn is_valid_phone(phone: &str) -> bool {
    NANP_PHONE_REGEX.is_match(phone.trim())
}

pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Renders a ten digit number as `(XXX) XXX-XXXX`; anything else comes back unchanged.
pub fn format_phone_number(phone: &str) -> String {
    let digits = phone_digits(phone);

    if digits.len() != PHONE_DIGIT_COUNT {
        return phone.to_string();
    }

    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..])
}

/// Drops script blocks and markup from visitor text and trims the result.
pub fn sanitize_text(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_REGEX.replace_all(input, "");
    let without_tags = HTML_TAG_REGEX.replace_all(&without_scripts, "");
    without_tags.trim().to_string()
}
