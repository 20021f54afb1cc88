//! Invitation token generation and hashing.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::SecretString;

/// Default token length in characters (~190 bits of entropy).
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Generates a random alphanumeric token from the thread-local CSPRNG.
///
/// # Example
///
/// ```rust
/// use leasehold::crypto::generate_token;
///
/// let token = generate_token(32);
/// assert_eq!(token.expose_secret().len(), 32);
/// ```
pub fn generate_token(length: usize) -> SecretString {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    SecretString::new(token)
}

/// SHA-256 hex digest of a token.
///
/// Tokens are high-entropy random strings, so a fast unsalted hash is
/// enough to make the stored id irreversible. The digest doubles as the
/// invitation's document id.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Short random identifier for correlating log lines and audit events.
pub fn correlation_id() -> String {
    generate_token(12).expose_secret().to_ascii_lowercase()
}
