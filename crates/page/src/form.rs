//! Contact form validation.

use regex::Regex;
use serde::{Deserialize, Serialize};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Why a contact submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// A required field was empty
    #[error("Please fill in the {0} field.")]
    MissingField(&'static str),

    /// The email address is not well-formed
    #[error("Please enter a valid email address.")]
    InvalidEmail(String),
}

/// A contact form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Message subject
    pub subject: String,
    /// Message body
    pub message: String,
}

impl ContactForm {
    /// Check that every field is filled and the email looks valid.
    pub fn validate(&self) -> Result<(), FormError> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(FormError::MissingField(field));
            }
        }

        let email = self.email.trim();
        match Regex::new(EMAIL_PATTERN) {
            Ok(re) if re.is_match(email) => Ok(()),
            _ => Err(FormError::InvalidEmail(email.to_string())),
        }
    }
}
