use serde_with::{DeserializeFromStr, SerializeDisplay};

/// A mailbox address checked with `validator`, used for the configured
/// sender and recipient of contact notifications.
#[derive(Clone, Debug, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct EmailAddress(String);

#[derive(Debug, thiserror::Error)]
pub enum ParseEmailAddressError {
    #[error("{0:?} is not a valid email address")]
    Invalid(String),
}

impl std::str::FromStr for EmailAddress {
    type Err = ParseEmailAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if validator::validate_email(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseEmailAddressError::Invalid(s.to_string()))
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
