use thiserror::Error;

/// Error raised while assembling configuration for the mysqlink crates.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Duration(#[from] crate::duration::DurationError),
}
