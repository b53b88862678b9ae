//! Email Value Object
//!
//! Normalized (trimmed, lower-cased), format-validated email address.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a normalized address
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Domains of common personal mailbox providers
pub const PERSONAL_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "protonmail.com",
    "proton.me",
    "mail.com",
    "gmx.com",
    "yandex.com",
    "zoho.com",
];

static EMAIL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9!#$%&'*+/=?^_`{|}~.-]+@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,}$")
        .expect("email pattern is valid")
});

/// Email value object with validation
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Create a new validated email
    pub fn new(value: impl AsRef<str>) -> Result<Self, EmailError> {
        let value = value.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(EmailError::Empty);
        }

        let length = value.chars().count();
        if length > MAX_EMAIL_LENGTH {
            return Err(EmailError::TooLong(length));
        }

        if Self::has_misplaced_dots(&value) {
            return Err(EmailError::InvalidDotPlacement);
        }

        if !EMAIL_FORMAT.is_match(&value) {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(value))
    }

    /// Get the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the domain part of the email
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, domain)| domain).unwrap_or_default()
    }

    /// Get the local part (before @)
    pub fn local_part(&self) -> &str {
        self.0.rsplit_once('@').map(|(local, _)| local).unwrap_or_default()
    }

    /// Whether the address is outside the well-known personal providers.
    ///
    /// Informational only; this is not a security boundary.
    pub fn is_business_email(&self) -> bool {
        self.is_business_email_with(&[])
    }

    /// Same as [`Email::is_business_email`] with additional personal domains.
    pub fn is_business_email_with(&self, extra_personal_domains: &[String]) -> bool {
        let domain = self.domain();
        !PERSONAL_EMAIL_DOMAINS.contains(&domain)
            && !extra_personal_domains
                .iter()
                .any(|d| d.trim().eq_ignore_ascii_case(domain))
    }

    fn has_misplaced_dots(value: &str) -> bool {
        if value.contains("..") || value.starts_with('.') || value.ends_with('.') {
            return true;
        }
        match value.rsplit_once('@') {
            Some((local, domain)) => {
                local.starts_with('.')
                    || local.ends_with('.')
                    || domain.starts_with('.')
                    || domain.ends_with('.')
            }
            None => false,
        }
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email must be at most {MAX_EMAIL_LENGTH} characters, got {0}")]
    TooLong(usize),

    #[error("email cannot contain consecutive dots or start/end with a dot")]
    InvalidDotPlacement,

    #[error("invalid email format")]
    InvalidFormat,
}
