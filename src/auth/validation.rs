use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, RegisterRequest};

const MIN_PASSWORD_LEN: usize = 8;
const MIN_FULL_NAME_LEN: usize = 2;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,20}$").unwrap();
    // Anchored, plain character classes only.
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

/// Form field a validation error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
    FullName,
    Identifier,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::FullName => "fullName",
            Field::Identifier => "identifier",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Username => "Username",
            Field::Email => "Email",
            Field::Password | Field::ConfirmPassword => "Password",
            Field::FullName => "Full name",
            Field::Identifier => "Username or email",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which rule a field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Required,
    FormatInvalid,
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub kind: ErrorKind,
}

impl FieldError {
    pub fn new(field: Field, kind: ErrorKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.field, self.kind) {
            (field, ErrorKind::Required) => write!(f, "{} is required", field),
            (Field::Username, ErrorKind::FormatInvalid) => f.write_str(
                "Username must be 3-20 characters and contain only letters, numbers, and underscores",
            ),
            (Field::Email, ErrorKind::FormatInvalid) => {
                f.write_str("Please enter a valid email address")
            }
            (field, ErrorKind::FormatInvalid) => write!(f, "{} is invalid", field),
            (Field::Password, ErrorKind::TooShort) => write!(
                f,
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            ),
            (Field::FullName, ErrorKind::TooShort) => write!(
                f,
                "Full name must be at least {} characters long",
                MIN_FULL_NAME_LEN
            ),
            (field, ErrorKind::TooShort) => write!(f, "{} is too short", field),
            (_, ErrorKind::MissingUppercase) => {
                f.write_str("Password must contain at least one uppercase letter")
            }
            (_, ErrorKind::MissingLowercase) => {
                f.write_str("Password must contain at least one lowercase letter")
            }
            (_, ErrorKind::MissingDigit) => f.write_str("Password must contain at least one number"),
            (_, ErrorKind::Mismatch) => f.write_str("Passwords do not match"),
        }
    }
}

impl std::error::Error for FieldError {}

/// Outcome of a whole-form check. Errors keep field-check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn check(&mut self, outcome: Result<(), FieldError>) {
        if let Err(e) = outcome {
            self.errors.push(e);
        }
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    if is_blank(username) {
        return Err(FieldError::new(Field::Username, ErrorKind::Required));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(FieldError::new(Field::Username, ErrorKind::FormatInvalid));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if is_blank(email) {
        return Err(FieldError::new(Field::Email, ErrorKind::Required));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(FieldError::new(Field::Email, ErrorKind::FormatInvalid));
    }
    Ok(())
}

/// Reports only the first broken rule: length, uppercase, lowercase, digit.
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    let fail = |kind| Err(FieldError::new(Field::Password, kind));

    if password.is_empty() {
        return fail(ErrorKind::Required);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return fail(ErrorKind::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return fail(ErrorKind::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return fail(ErrorKind::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return fail(ErrorKind::MissingDigit);
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), FieldError> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(Field::FullName, ErrorKind::Required));
    }
    if trimmed.chars().count() < MIN_FULL_NAME_LEN {
        return Err(FieldError::new(Field::FullName, ErrorKind::TooShort));
    }
    Ok(())
}

/// Checks every field and collects all failures.
pub fn validate_registration_form(form: &RegisterRequest) -> ValidationResult {
    let mut result = ValidationResult::default();

    result.check(validate_username(&form.username));
    result.check(validate_email(&form.email));
    result.check(validate_password(&form.password));
    if form.password != form.confirm_password {
        result
            .errors
            .push(FieldError::new(Field::ConfirmPassword, ErrorKind::Mismatch));
    }
    result.check(validate_full_name(&form.full_name));

    result
}

/// Presence checks only, so passwords created under older rules still log in.
pub fn validate_login_form(form: &LoginRequest) -> ValidationResult {
    let mut result = ValidationResult::default();

    if is_blank(&form.identifier) {
        result
            .errors
            .push(FieldError::new(Field::Identifier, ErrorKind::Required));
    }
    if form.password.is_empty() {
        result
            .errors
            .push(FieldError::new(Field::Password, ErrorKind::Required));
    }

    result
}
