//! Login and registration form validation
//!
//! Errors here are field-scoped and never reach the coordinator.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{LoginCredentials, RegisterCredentials};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum accepted display-name length (after trimming)
pub const MIN_NAME_LEN: usize = 2;

/// A form field that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm password",
        })
    }
}

/// Validation messages keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"))
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !email_pattern().is_match(email) {
        errors.insert(Field::Email, "Email is invalid");
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.insert(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(Field::Password, "Password must be at least 6 characters");
    }
}

/// Validate a login form
pub fn validate_login(credentials: &LoginCredentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_email(&credentials.email, &mut errors);
    check_password(&credentials.password, &mut errors);
    errors.into_result()
}

/// Validate a registration form
pub fn validate_register(credentials: &RegisterCredentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = credentials.name.trim();
    if name.is_empty() {
        errors.insert(Field::Name, "Name is required");
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.insert(Field::Name, "Name must be at least 2 characters");
    }

    check_email(&credentials.email, &mut errors);
    check_password(&credentials.password, &mut errors);

    if credentials.confirm_password.is_empty() {
        errors.insert(Field::ConfirmPassword, "Please confirm your password");
    } else if credentials.password != credentials.confirm_password {
        errors.insert(Field::ConfirmPassword, "Passwords do not match");
    }

    errors.into_result()
}
