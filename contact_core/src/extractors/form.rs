//! Contact form body extractor accepting JSON or urlencoded posts

use crate::error::AppError;
use crate::models::ContactFormInput;
use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};

pub struct ContactSubmission(pub ContactFormInput);

fn is_urlencoded(req: &Request<Body>) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON request body",
        JsonRejection::JsonDataError(_) => "Request body does not match the contact form fields",
        JsonRejection::MissingJsonContentType(_) => {
            "Expected a JSON or form-encoded request body"
        }
        _ => "Could not read the request body",
    }
}

#[async_trait]
impl<S> FromRequest<S> for ContactSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        if is_urlencoded(&req) {
            let Form(input) = Form::<ContactFormInput>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    tracing::debug!("Rejected form body: {}", rejection);
                    AppError::BadRequest("Invalid form submission".to_string())
                })?;
            return Ok(ContactSubmission(input));
        }

        let Json(input) = Json::<ContactFormInput>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                AppError::BadRequest(json_rejection_message(&rejection).to_string())
            })?;

        Ok(ContactSubmission(input))
    }
}
