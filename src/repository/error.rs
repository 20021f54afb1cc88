//! Storage-tier errors and the provider code translation table.
//!
//! Back-ends report failures with provider-specific code strings
//! (`"unavailable"`, `"firestore/aborted"`, `"auth/email-already-in-use"`).
//! They are translated once, at the storage boundary, into the closed
//! [`StoreErrorCode`] enum. Nothing above this module matches on strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resilience::Classification;

/// Closed set of storage and identity-service failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreErrorCode {
    Unavailable,
    Aborted,
    DeadlineExceeded,
    ResourceExhausted,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    FailedPrecondition,
    InvalidArgument,
    Unauthenticated,
    Internal,
    Unknown,
}

impl StoreErrorCode {
    /// Translates a provider error code into the closed enum.
    ///
    /// Accepts bare codes and codes carrying a provider prefix
    /// (`firestore/`, `auth/`). Separators `_` and `-` are interchangeable
    /// and matching is case-insensitive. Unrecognised codes map to
    /// [`StoreErrorCode::Unknown`], which is terminal.
    pub fn from_provider_code(code: &str) -> Self {
        let normalized = code.trim().to_ascii_lowercase().replace('_', "-");
        let bare = normalized
            .rsplit_once('/')
            .map_or(normalized.as_str(), |(_, tail)| tail);

        match bare {
            "unavailable" | "network-request-failed" => Self::Unavailable,
            "aborted" => Self::Aborted,
            "deadline-exceeded" | "timeout" => Self::DeadlineExceeded,
            "resource-exhausted" | "too-many-requests" | "quota-exceeded" => {
                Self::ResourceExhausted
            }
            "not-found" | "user-not-found" => Self::NotFound,
            "already-exists" | "email-already-in-use" => Self::AlreadyExists,
            "permission-denied" | "insufficient-permission" => Self::PermissionDenied,
            "failed-precondition" => Self::FailedPrecondition,
            "invalid-argument" | "invalid-email" | "weak-password" | "invalid-password" => {
                Self::InvalidArgument
            }
            "unauthenticated" => Self::Unauthenticated,
            "internal" | "data-loss" => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Aborted => "aborted",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::ResourceExhausted => "resource-exhausted",
            Self::NotFound => "not-found",
            Self::AlreadyExists => "already-exists",
            Self::PermissionDenied => "permission-denied",
            Self::FailedPrecondition => "failed-precondition",
            Self::InvalidArgument => "invalid-argument",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }

    /// Transient codes that are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::Aborted | Self::DeadlineExceeded | Self::ResourceExhausted
        )
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against the document store or identity service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an error from a raw provider code string.
    pub fn from_provider(code: &str, message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::from_provider_code(code), message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unavailable, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::AlreadyExists, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Internal, message)
    }

    /// Classification used by the resilient executor.
    pub fn classification(&self) -> Classification {
        Classification::of(self.code)
    }
}
