//! Snapshot of a single upstream read.

use serde::{Deserialize, Serialize};

/// `{data, isLoading, isError}` view of one contract read.
///
/// Stale `data` survives a failed refresh; `is_error` reports the most recent
/// attempt only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_error: bool,
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T> ReadState<T> {
    pub fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            is_error: false,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            is_error: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_error: true,
        }
    }

    /// Resolved with data on the latest attempt.
    pub fn is_success(&self) -> bool {
        !self.is_loading && !self.is_error && self.data.is_some()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}
