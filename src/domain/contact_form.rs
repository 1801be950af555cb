use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::IgnoredAny, Deserialize, Deserializer};
use unicode_segmentation::UnicodeSegmentation;

use super::ContactSubmission;

const MINIMUM_NAME_LENGTH: usize = 2;
const MINIMUM_SUBJECT_LENGTH: usize = 3;
const MINIMUM_MESSAGE_LENGTH: usize = 10;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Contact form as posted by the portfolio page. Any field may be absent;
/// a field that is not text counts as absent without affecting the others.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default, deserialize_with = "text_or_absent")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "text_or_absent")]
    pub message: Option<String>,
}

fn text_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Text(text) => Some(text),
        Field::Other(_) => None,
    })
}

/// Human readable rule violations, in field order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl AsRef<[String]> for ValidationErrors {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks every field of `form` and returns the violated rules. An empty
/// list means the form can be turned into a [`ContactSubmission`].
pub fn validate(form: &ContactForm) -> Vec<String> {
    let mut errors = Vec::new();

    if !has_minimum_length(form.name.as_deref(), MINIMUM_NAME_LENGTH) {
        errors.push(format!(
            "Name must be at least {} characters long",
            MINIMUM_NAME_LENGTH
        ));
    }

    if !form.email.as_deref().map_or(false, is_valid_email) {
        errors.push("Valid email address is required".to_string());
    }

    if !has_minimum_length(form.subject.as_deref(), MINIMUM_SUBJECT_LENGTH) {
        errors.push(format!(
            "Subject must be at least {} characters long",
            MINIMUM_SUBJECT_LENGTH
        ));
    }

    if !has_minimum_length(form.message.as_deref(), MINIMUM_MESSAGE_LENGTH) {
        errors.push(format!(
            "Message must be at least {} characters long",
            MINIMUM_MESSAGE_LENGTH
        ));
    }

    errors
}

fn has_minimum_length(value: Option<&str>, minimum: usize) -> bool {
    value.map_or(false, |value| value.trim().graphemes(true).count() >= minimum)
}

fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = ValidationErrors;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let errors = validate(&form);
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        // Every field is present once validation passed.
        let field = |value: Option<String>| value.unwrap_or_default();
        Ok(ContactSubmission {
            name: field(form.name).trim().to_string(),
            email: field(form.email),
            subject: field(form.subject).trim().to_string(),
            message: field(form.message).trim().to_string(),
        })
    }
}
