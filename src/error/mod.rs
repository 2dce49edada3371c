use thiserror::Error;

/// Everything that can go wrong while handling a pool request.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("{0} is required.")]
    MissingField(String),

    #[error("Invalid answer for {0}.")]
    InvalidValue(String),

    #[error("Unknown question {0}.")]
    UnknownQuestionKey(String),

    #[error("Entry {0} not found.")]
    NotFound(String),

    #[error("No updates provided.")]
    NoUpdatesProvided,

    #[error("Failed to {action}: {source}")]
    PersistenceFailure {
        action: &'static str,
        #[source]
        source: sqlx::Error,
    },

    // A row that exists but cannot be turned back into an entry.
    #[error("Stored entry {entry_id} is unreadable: {reason}")]
    CorruptEntry { entry_id: String, reason: String },
}

impl PoolError {
    pub fn persistence(action: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| PoolError::PersistenceFailure { action, source }
    }

    /// True for errors caused by the caller's input rather than by the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PoolError::MissingField(_)
                | PoolError::InvalidValue(_)
                | PoolError::UnknownQuestionKey(_)
                | PoolError::NoUpdatesProvided
        )
    }
}

/// Problems found while reading settings or the question catalog at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidVar {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Failed to read question catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse question catalog {path}: {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid question catalog: {0}")]
    InvalidCatalog(String),
}
