use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::domain::EmailAddress;

/// Client for the transactional email HTTP API that delivers contact
/// notifications.
#[derive(Clone, Debug)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: EmailAddress,
    authorization_token: String,
}

/// One outgoing message.
#[derive(Clone, Copy, Debug)]
pub struct Email<'a> {
    pub recipient: &'a EmailAddress,
    pub reply_to: &'a str,
    pub subject: &'a str,
    pub html_body: &'a str,
    pub text_body: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: impl Into<String>,
        sender: EmailAddress,
        authorization_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(EmailClient {
            http_client,
            base_url: base_url.into(),
            sender,
            authorization_token: authorization_token.into(),
        })
    }

    pub fn sender(&self) -> &EmailAddress {
        &self.sender
    }

    pub async fn send_email(&self, email: Email<'_>) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url.trim_end_matches('/'));
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: email.recipient.as_ref(),
            reply_to: email.reply_to,
            subject: email.subject,
            html_body: email.html_body,
            text_body: email.text_body,
        };

        self.http_client
            .post(&url)
            .header("X-Postmark-Server-Token", &self.authorization_token)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
