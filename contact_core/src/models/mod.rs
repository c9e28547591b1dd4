pub mod contact;
pub mod request;

pub use contact::{ContactFormInput, FieldError, ServiceInterest, ServiceOption, ValidatedContact};
pub use request::ApiResponse;
