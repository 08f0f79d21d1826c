//! Shared MySQL connection for a process.
//!
//! [`init`] turns a [`ConnectionOptions`] record into a DSN, opens a sqlx
//! pool with the requested limits and publishes it; [`get_db`] hands the
//! published [`Db`] to the rest of the application. Code that prefers an
//! owned dependency over a global can hold its own [`ConnectionManager`].

pub mod dsn;
pub mod error;
pub mod handle;
pub mod logger;
pub mod manager;
pub mod options;
pub mod session;

pub use dsn::Dsn;
pub use error::DbError;
pub use handle::Db;
pub use logger::{LogLevel, SqlLogger, StatementEvent, TraceKind, TracingLogger};
pub use manager::{ConnectionManager, get_db, global, init};
pub use options::{ConnectionOptions, PoolLimits};
pub use session::{NamingStrategy, SessionConfig};

pub use sqlx::MySqlPool;
