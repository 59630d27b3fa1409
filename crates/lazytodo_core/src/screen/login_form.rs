//! Login form validation.
//!
//! # Invariants
//! - Field values are never logged.

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_PASSWORD_CHARS: usize = 6;

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_INVALID: &str = "Valid email is required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Per-field messages; `None` means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

impl LoginForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let errors = FormErrors {
            name: self.name.trim().is_empty().then_some(NAME_REQUIRED),
            email: (self.email.trim().is_empty() || !EMAIL_RE.is_match(&self.email))
                .then_some(EMAIL_INVALID),
            password: (self.password.trim().is_empty()
                || self.password.chars().count() < MIN_PASSWORD_CHARS)
                .then_some(PASSWORD_TOO_SHORT),
        };
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates and records a metadata-only submit event.
    pub fn submit(&self) -> Result<(), FormErrors> {
        self.validate()?;
        info!("event=form_submit module=screen status=ok form=login");
        Ok(())
    }
}
