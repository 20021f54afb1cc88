use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::SecretString;

/// Password rules applied before an identity is created.
///
/// # Examples
///
/// ```
/// use leasehold::validators::PasswordPolicy;
/// use leasehold::SecretString;
///
/// let policy = PasswordPolicy::default();
/// assert!(policy.validate(&SecretString::new("lease2024")).is_ok());
/// assert!(policy.validate(&SecretString::new("short")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Minimum length in characters. Default: 8
    pub min_length: usize,
    /// Maximum length in characters. Default: 128
    pub max_length: usize,
    /// Require at least one letter and one digit. Default: false
    pub require_letter_and_digit: bool,
    /// Rejected regardless of the other rules (case-insensitive).
    #[serde(default)]
    pub disallowed: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter_and_digit: false,
            disallowed: Vec::new(),
        }
    }
}

impl PasswordPolicy {
    /// 12+ characters, letters and digits, common passwords rejected.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min_length: 12,
            max_length: 128,
            require_letter_and_digit: true,
            disallowed: ["password1234", "qwerty123456", "123456789012"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn validate(&self, password: &SecretString) -> Result<(), ValidationError> {
        let raw = password.expose_secret();

        if raw.is_empty() {
            return Err(ValidationError::PasswordEmpty);
        }

        let len = password.char_count();
        if len < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }

        if len > self.max_length {
            return Err(ValidationError::PasswordTooLong(self.max_length));
        }

        if self.require_letter_and_digit
            && !(raw.chars().any(char::is_alphabetic) && raw.chars().any(|c| c.is_ascii_digit()))
        {
            return Err(ValidationError::PasswordTooSimple);
        }

        if self.disallowed.iter().any(|p| p.eq_ignore_ascii_case(raw)) {
            return Err(ValidationError::PasswordCommon);
        }

        Ok(())
    }
}
