use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{
        rejection::ContentLengthLimitRejection, ContentLengthLimit, Form, FromRequest,
        RequestParts,
    },
    Json,
};
use http::{header, StatusCode};

use crate::{
    domain::ContactForm,
    error::{Error, ResponseError},
};

/// Largest accepted request body, in bytes.
pub const BODY_LIMIT: u64 = 100 * 1024;

/// Contact form read from a JSON or URL-encoded body, chosen by
/// `Content-Type`. A body that cannot be parsed yields an empty form.
#[derive(Debug)]
pub struct ContactPayload(pub ContactForm);

#[derive(Debug, thiserror::Error)]
pub enum PayloadRejection {
    #[error("request body is larger than {} bytes", BODY_LIMIT)]
    TooLarge,
    #[error("request body has no declared length")]
    LengthRequired,
}

impl ResponseError for PayloadRejection {
    fn status_code(&self) -> StatusCode {
        match *self {
            PayloadRejection::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            PayloadRejection::LengthRequired => StatusCode::LENGTH_REQUIRED,
        }
    }

    fn public_message(&self) -> String {
        match *self {
            PayloadRejection::TooLarge => "Request body is too large".into(),
            PayloadRejection::LengthRequired => "Request body length is required".into(),
        }
    }
}

#[async_trait]
impl FromRequest<Body> for ContactPayload {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<Body>) -> Result<Self, Self::Rejection> {
        let form = if is_form_encoded(req) {
            ContentLengthLimit::<Form<ContactForm>, BODY_LIMIT>::from_request(req)
                .await
                .map(|ContentLengthLimit(Form(form))| form)
                .or_else(empty_unless_oversized)?
        } else {
            ContentLengthLimit::<Json<ContactForm>, BODY_LIMIT>::from_request(req)
                .await
                .map(|ContentLengthLimit(Json(form))| form)
                .or_else(empty_unless_oversized)?
        };

        Ok(ContactPayload(form))
    }
}

fn is_form_encoded(req: &RequestParts<Body>) -> bool {
    req.headers()
        .and_then(|headers| headers.get(header::CONTENT_TYPE))
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

fn empty_unless_oversized<T>(
    rejection: ContentLengthLimitRejection<T>,
) -> Result<ContactForm, PayloadRejection> {
    match rejection {
        ContentLengthLimitRejection::PayloadTooLarge(_) => Err(PayloadRejection::TooLarge),
        ContentLengthLimitRejection::LengthRequired(_) => Err(PayloadRejection::LengthRequired),
        _ => Ok(ContactForm::default()),
    }
}
