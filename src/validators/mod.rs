//! Input validation for signup requests.

mod email;
mod name;
mod password;

pub use email::{normalize_email, validate_email};
pub use name::validate_name;
pub use password::PasswordPolicy;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Email cannot be empty")]
    EmailEmpty,
    #[error("Email is too long (max 254 characters)")]
    EmailTooLong,
    #[error("Invalid email format")]
    EmailInvalidFormat,
    #[error("Password cannot be empty")]
    PasswordEmpty,
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("Password is too long (max {0} characters)")]
    PasswordTooLong(usize),
    #[error("Password must contain a letter and a digit")]
    PasswordTooSimple,
    #[error("Password is too common")]
    PasswordCommon,
    #[error("Name cannot be empty")]
    NameEmpty,
    #[error("Name is too long (max 100 characters)")]
    NameTooLong,
}
