use crate::repository::StoreErrorCode;

/// Outcome of classifying a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub retryable: bool,
    pub code: StoreErrorCode,
}

impl Classification {
    /// Classifies by code alone: retryable exactly when the code is in the
    /// transient set (unavailable, aborted, deadline-exceeded,
    /// resource-exhausted).
    pub fn of(code: StoreErrorCode) -> Self {
        Self {
            retryable: code.is_retryable(),
            code,
        }
    }

    pub fn terminal(code: StoreErrorCode) -> Self {
        Self {
            retryable: false,
            code,
        }
    }
}
