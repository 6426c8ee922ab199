use lazy_static::lazy_static;
use regex::Regex;

use super::repo_types::Role;
use crate::error::{AppError, FieldError};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trimmed and lowercased address.
pub fn email(raw: &str) -> Result<String, FieldError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if !is_valid_email(&email) {
        return Err(FieldError::new("email", "Invalid email format"));
    }
    Ok(email)
}

pub fn username(raw: &str) -> Result<String, FieldError> {
    let username = raw.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(FieldError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(FieldError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(username.to_string())
}

/// Username for a registration that did not pick one: the e-mail local part
/// with anything outside `[A-Za-z0-9_]` turned into `_`.
pub fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Supplied username, or one derived from the email when none was given.
/// `None` when there is neither.
pub fn username_or_derived(
    raw: Option<&str>,
    email: Option<&str>,
) -> Option<Result<String, FieldError>> {
    match raw.map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => Some(username(raw)),
        None => email.map(|e| {
            username(&username_from_email(e)).map_err(|mut err| {
                err.message = format!("{} (derived from email; please choose one)", err.message);
                err
            })
        }),
    }
}

pub fn password(raw: &str) -> Result<(), FieldError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

pub fn role(raw: &str) -> Result<Role, FieldError> {
    Role::parse(raw.trim()).ok_or_else(|| FieldError::new("role", "Role must be 'user' or 'admin'"))
}

pub fn name(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

/// Collects field errors so a request reports every bad field at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the value on success, records the error otherwise.
    pub fn take<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    pub fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}
