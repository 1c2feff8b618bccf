use thiserror::Error;

/// SQLite primary result codes that mean the database file itself cannot be used.
/// BUSY (5) and LOCKED (6) are contention and stay plain database errors.
const SQLITE_READONLY: i32 = 8;
const SQLITE_IOERR: i32 = 10;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_NOTADB: i32 = 26;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Remote submit failed: {0}")]
    RemoteSubmitFailed(String),
    #[error("Local state diverged from queue: {0}")]
    DivergenceWarning(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }

    /// Errors that a later attempt (next drain, next connectivity event) may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::RemoteSubmitFailed(_)
        )
    }
}

fn is_unusable_sqlite_code(code: &str) -> bool {
    match code.parse::<i32>() {
        Ok(value) => matches!(
            value & 0xff,
            SQLITE_READONLY
                | SQLITE_IOERR
                | SQLITE_FULL
                | SQLITE_CANTOPEN
                | SQLITE_NOTADB
        ),
        Err(_) => false,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::StorageUnavailable(err.to_string()),
            sqlx::Error::Configuration(_) => AppError::ConfigurationError(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let unusable = db_err
                    .code()
                    .map(|code| is_unusable_sqlite_code(&code))
                    .unwrap_or(false);
                if unusable {
                    AppError::StorageUnavailable(err.to_string())
                } else {
                    AppError::Database(err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        match err {
            sqlx::migrate::MigrateError::Execute(inner) => AppError::from(inner),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
