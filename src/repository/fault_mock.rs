#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::StoreError;

/// Scripted failures and call counts for the in-memory repositories.
///
/// Each queued error is returned by exactly one future call of the named
/// operation, in order. Operations with an empty queue succeed.
#[derive(Clone, Default)]
pub struct FaultPlan {
    queued: Arc<Mutex<HashMap<&'static str, VecDeque<StoreError>>>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next call of `operation` with `error`.
    pub fn fail_next(&self, operation: &'static str, error: StoreError) {
        self.queued
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Fails the next `times` calls of `operation` with clones of `error`.
    pub fn fail_times(&self, operation: &'static str, times: usize, error: StoreError) {
        for _ in 0..times {
            self.fail_next(operation, error.clone());
        }
    }

    /// Number of calls observed for `operation`, failed ones included.
    pub fn calls(&self, operation: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;

        let next = self
            .queued
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front);

        match next {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
