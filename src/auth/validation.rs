use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::SignUpRequest;

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in request field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        // dot-atom local part; domain of two or more hostname labels
        static ref EMAIL_RE: Regex = Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?",
            r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
        ))
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_signup(req: &SignUpRequest) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: &str| {
        errors.push(FieldError {
            field,
            message: message.to_owned(),
        })
    };

    for (field, value) in [
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("user_name", &req.user_name),
    ] {
        if value.is_empty() {
            fail(field, "is required");
        }
    }

    if req.email.is_empty() {
        fail("email", "is required");
    } else if !is_valid_email(&req.email) {
        fail("email", "must be a valid email address");
    }

    // lengths are counted in characters, not bytes
    let password_len = req.password.chars().count();
    if req.password.is_empty() {
        fail("password", "is required");
    } else if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_len) {
        fail("password", "must be between 8 and 32 characters");
    }

    if req.confirm_password.is_empty() {
        fail("confirm_password", "is required");
    } else if req.confirm_password.chars().count() < PASSWORD_MIN {
        fail("confirm_password", "must be at least 8 characters");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
