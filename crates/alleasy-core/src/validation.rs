//! Client-side checks run on login and registration input before any
//! request is sent.

use thiserror::Error;

/// Minimum password length the forms accept
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Longest label allowed in an email domain
const MAX_DOMAIN_LABEL_LENGTH: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Email is required")]
    EmailRequired,

    #[error("Enter a valid email address")]
    EmailInvalid,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Confirm your password")]
    ConfirmationRequired,

    #[error("Passwords must match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Every problem with the input, empty when it may be submitted
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        errors.extend(check_email(&self.email));
        errors.extend(check_password(&self.password));
        errors
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::NameRequired);
        }
        errors.extend(check_email(&self.email));
        errors.extend(check_password(&self.password));
        if self.confirm_password.is_empty() {
            errors.push(ValidationError::ConfirmationRequired);
        } else if self.confirm_password != self.password {
            errors.push(ValidationError::PasswordMismatch);
        }
        errors
    }
}

fn check_email(email: &str) -> Option<ValidationError> {
    if email.trim().is_empty() {
        Some(ValidationError::EmailRequired)
    } else if !is_valid_email(email) {
        Some(ValidationError::EmailInvalid)
    } else {
        None
    }
}

fn check_password(password: &str) -> Option<ValidationError> {
    if password.is_empty() {
        Some(ValidationError::PasswordRequired)
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some(ValidationError::PasswordTooShort)
    } else {
        None
    }
}

/// Email shape check: `local@domain` where the local part uses the usual
/// atom characters and the domain is one or more dot-separated labels.
/// A top-level domain is not required (`sydney@fife` passes).
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c));

    let domain_ok = !domain.is_empty()
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= MAX_DOMAIN_LABEL_LENGTH
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}
