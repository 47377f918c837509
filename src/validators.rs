/// Input validation collaborator
///
/// Pure field-rule checks applied at the boundary before the session
/// manager is invoked. Each function collects every failed rule instead of
/// stopping at the first, so clients see the full list in one round trip.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_NAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Registration input that passed every field rule.
#[derive(Debug, Clone)]
pub struct ValidRegister {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input that passed every field rule.
#[derive(Debug, Clone)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

pub fn validate_register(
    name: &str,
    email: &str,
    password: &str,
) -> Result<ValidRegister, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        errors.push(field_error("name", "must not be empty"));
    } else if name.len() > MAX_NAME_LENGTH {
        errors.push(field_error(
            "name",
            &format!("must not exceed {} characters", MAX_NAME_LENGTH),
        ));
    }

    let email = match checked_email(email) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(field_error(
            "password",
            &format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    } else if password.len() > MAX_PASSWORD_LENGTH {
        errors.push(field_error(
            "password",
            &format!("must not exceed {} characters", MAX_PASSWORD_LENGTH),
        ));
    }

    if errors.is_empty() {
        Ok(ValidRegister {
            name: name.to_string(),
            email: email.unwrap_or_default(),
            password: password.to_string(),
        })
    } else {
        Err(errors)
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<ValidLogin, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = match checked_email(email) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    if password.is_empty() {
        errors.push(field_error("password", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(ValidLogin {
            email: email.unwrap_or_default(),
            password: password.to_string(),
        })
    } else {
        Err(errors)
    }
}

fn checked_email(email: &str) -> Result<String, FieldError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(field_error("email", "must not be empty"));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(field_error(
            "email",
            &format!("must not exceed {} characters", MAX_EMAIL_LENGTH),
        ));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(field_error("email", "has invalid format"));
    }

    Ok(trimmed.to_lowercase())
}

fn field_error(field: &'static str, message: &str) -> FieldError {
    FieldError {
        field,
        message: message.to_string(),
    }
}
