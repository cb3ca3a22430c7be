//! Error types for `task_reminders`.

/// Errors that can occur while managing tasks and reminders.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Input was rejected before any mutation happened.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The in-memory update was applied but the durable write failed.
    #[error("Persistence failed: {source}")]
    PersistenceFailed {
        /// The underlying storage error.
        #[source]
        source: Box<Error>,
    },

    /// The authentication gate rejected the caller.
    #[error("Authentication required (redirected to {redirect})")]
    Unauthenticated {
        /// Where the caller was sent to log in.
        redirect: String,
    },

    /// The home directory could not be determined.
    #[error("Could not determine a data directory (no home directory)")]
    NoDataDir,
}

impl Error {
    /// Build a validation error from a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a storage error as a persistence failure.
    #[must_use]
    pub fn persistence(source: Self) -> Self {
        Self::PersistenceFailed { source: Box::new(source) }
    }

    /// Whether the in-memory state was updated despite this error.
    #[must_use]
    pub const fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::PersistenceFailed { .. })
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
