mod payload;

pub use payload::{ContactPayload, PayloadRejection, BODY_LIMIT};

use std::fmt;

use anyhow::Context;
use axum::{extract::Extension, Json};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::{
    domain::{ContactForm, ContactSubmission, ValidationErrors},
    email_client::{Email, EmailClient},
    error::{Error, ResponseError},
    rate_limit::RateLimited,
    startup::ContactRecipient,
};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    success: bool,
    message: &'static str,
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("submission failed validation: {0}")]
    ValidationError(ValidationErrors),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl fmt::Debug for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ContactError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ContactError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match *self {
            ContactError::ValidationError(_) => "Validation failed".into(),
            ContactError::UnexpectedError(_) => {
                "Failed to send message. Please try again later or contact me directly via email."
                    .into()
            }
        }
    }

    fn errors(&self) -> Option<Vec<String>> {
        match self {
            ContactError::ValidationError(errors) => Some(errors.as_ref().to_vec()),
            ContactError::UnexpectedError(_) => None,
        }
    }
}

/// `POST /api/contact`
///
/// The rate limit is checked before the body is read. Every response that
/// passed the rate limit carries the client's `X-RateLimit-*` headers.
pub async fn handler(
    rate_limit: RateLimited,
    Extension(email_client): Extension<EmailClient>,
    Extension(recipient): Extension<ContactRecipient>,
    payload: Result<ContactPayload, Error>,
) -> (HeaderMap, Result<Json<ContactResponse>, Error>) {
    let outcome = match payload {
        Ok(ContactPayload(form)) => relay(form, &email_client, &recipient).await,
        Err(rejection) => Err(rejection),
    };

    (rate_limit.headers(), outcome)
}

#[tracing::instrument(
    name = "Relaying a contact form submission",
    skip(form, email_client, recipient),
    fields(
        submitter_name = tracing::field::Empty,
        submitter_email = tracing::field::Empty,
    )
)]
async fn relay(
    form: ContactForm,
    email_client: &EmailClient,
    recipient: &ContactRecipient,
) -> Result<Json<ContactResponse>, Error> {
    let submission =
        ContactSubmission::try_from(form).map_err(ContactError::ValidationError)?;

    let span = tracing::Span::current();
    span.record("submitter_name", &tracing::field::display(submission.name()));
    span.record("submitter_email", &tracing::field::display(submission.email()));

    send_notification(email_client, recipient, &submission)
        .await
        .context("failed to send the contact notification")
        .map_err(ContactError::from)?;

    tracing::info!("contact form submission relayed");

    Ok(Json(ContactResponse {
        success: true,
        message: "Message sent successfully! I will get back to you soon.",
    }))
}

#[tracing::instrument(
    name = "Send the contact notification to the site owner",
    skip(email_client, recipient, submission)
)]
async fn send_notification(
    email_client: &EmailClient,
    recipient: &ContactRecipient,
    submission: &ContactSubmission,
) -> Result<(), reqwest::Error> {
    let subject = submission.email_subject();
    let html_body = submission.html_body();
    let text_body = submission.text_body();

    email_client
        .send_email(Email {
            recipient: recipient.address(),
            reply_to: submission.email(),
            subject: &subject,
            html_body: &html_body,
            text_body: &text_body,
        })
        .await
}
