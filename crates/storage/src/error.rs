use thiserror::Error;

/// Errors surfaced by the connection manager.
///
/// Driver failures are passed through untouched so callers see exactly what
/// sqlx reported.
#[derive(Debug, Error)]
pub enum DbError {
    /// The pool could not be opened: bad address, unreachable host, rejected
    /// credentials.
    #[error(transparent)]
    ConnectionOpen(sqlx::Error),

    /// The pool opened but could not hand out a usable connection.
    #[error(transparent)]
    HandleRetrieval(sqlx::Error),

    /// A connection was requested before any successful initialisation.
    #[error("database connection has not been initialized")]
    NotInitialized,

    #[error("invalid connection options: {0}")]
    InvalidOptions(String),

    #[error("malformed DSN: {0}")]
    MalformedDsn(String),

    /// A statement issued through a handle failed.
    #[error(transparent)]
    Statement(#[from] sqlx::Error),
}
