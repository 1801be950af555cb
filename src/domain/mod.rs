pub mod contact_form;
pub mod contact_submission;
pub mod email_address;

pub use self::email_address::EmailAddress;
pub use contact_form::{validate, ContactForm, ValidationErrors};
pub use contact_submission::ContactSubmission;
