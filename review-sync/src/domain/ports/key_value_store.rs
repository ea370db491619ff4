//! Driven port for the key-value store holding ORCID credentials.
//!
//! The store is enumerated with cursor-based scans, so a scan over a live
//! store reflects whatever keys exist while it runs and is not restartable.

use async_trait::async_trait;

use super::define_port_error;

/// Opaque SCAN cursor. A scan starts and finishes at [`ScanCursor::START`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanCursor(u64);

impl ScanCursor {
    /// Cursor that begins a new scan and marks a finished one.
    pub const START: Self = Self(0);

    /// Wrap a cursor value returned by the store.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw cursor value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this cursor ends (or begins) a scan.
    pub const fn is_start(self) -> bool {
        self.0 == 0
    }
}

/// Keys returned by one scan step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanPage {
    /// Keys matching the pattern in this step; may be empty.
    pub keys: Vec<String>,
    /// Cursor for the next step; [`ScanCursor::START`] when the scan is done.
    pub next: ScanCursor,
}

define_port_error! {
    /// Errors surfaced by the key-value store.
    pub enum KeyValueStoreError {
        /// No connection could be obtained.
        Connection { message: String } =>
            "key-value store connection failed: {message}",
        /// The store rejected or failed a command.
        Command { message: String } =>
            "key-value store command failed: {message}",
    }
}

/// Port for reading credential records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Run one scan step over keys matching a glob `pattern`.
    async fn scan(&self, cursor: ScanCursor, pattern: &str)
    -> Result<ScanPage, KeyValueStoreError>;

    /// Read the string value at `key`, or `None` when it is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;
}
