use std::{fmt, sync::Arc, time::Duration};

use mysqlink_core::{LogLevel, Settings, duration};

use crate::{
    dsn::Dsn,
    error::DbError,
    logger::{SqlLogger, TracingLogger},
};

/// Pool sizing applied to a freshly opened handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_open: u32,
    pub max_idle: u32,
    /// Zero means connections are reused forever.
    pub max_lifetime: Duration,
}

/// Everything needed to open the shared connection.
#[derive(Clone)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Dial timeout, as duration text such as `10s`.
    pub timeout: String,
    /// Read and write timeouts are validated and rendered into the DSN;
    /// the sqlx MySQL driver has no per-socket deadlines to apply them to.
    pub read_timeout: String,
    pub write_timeout: String,
    /// Time zone location name.
    pub loc: String,
    pub charset: String,
    /// Rendered into the DSN only; sqlx always decodes temporal columns
    /// into native values.
    pub parse_time: bool,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub max_connection_lifetime: Duration,
    pub log_level: LogLevel,
    pub logger: Arc<dyn SqlLogger>,
}

impl ConnectionOptions {
    pub fn with_logger(mut self, logger: Arc<dyn SqlLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn limits(&self) -> PoolLimits {
        PoolLimits {
            max_open: self.max_open_conns,
            max_idle: self.max_idle_conns,
            max_lifetime: self.max_connection_lifetime,
        }
    }

    pub fn dsn(&self) -> Dsn {
        Dsn {
            user: self.user.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            charset: self.charset.clone(),
            parse_time: self.parse_time,
            loc: self.loc.clone(),
            timeout: self.timeout.clone(),
            read_timeout: self.read_timeout.clone(),
            write_timeout: self.write_timeout.clone(),
        }
    }

    /// Dial timeout as a [`Duration`]. Call [`validate`](Self::validate)
    /// first to rule out malformed text.
    pub fn connect_timeout(&self) -> Result<Duration, DbError> {
        duration::parse(&self.timeout).map_err(|e| DbError::InvalidOptions(e.to_string()))
    }

    /// Reject options the driver would only fail on later, and more
    /// obscurely.
    pub fn validate(&self) -> Result<(), DbError> {
        let required = [
            ("host", &self.host),
            ("user", &self.user),
            ("database", &self.database),
            ("charset", &self.charset),
            ("loc", &self.loc),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DbError::InvalidOptions(format!("{name} must not be empty")));
            }
        }

        if self.port == 0 {
            return Err(DbError::InvalidOptions("port must be between 1 and 65535".into()));
        }

        for (name, value) in [
            ("timeout", &self.timeout),
            ("read_timeout", &self.read_timeout),
            ("write_timeout", &self.write_timeout),
        ] {
            duration::parse(value)
                .map_err(|e| DbError::InvalidOptions(format!("{name}: {e}")))?;
        }

        if self.max_open_conns == 0 {
            return Err(DbError::InvalidOptions("max_open_conns must be at least 1".into()));
        }
        if self.max_idle_conns > self.max_open_conns {
            return Err(DbError::InvalidOptions(format!(
                "max_idle_conns ({}) exceeds max_open_conns ({})",
                self.max_idle_conns, self.max_open_conns
            )));
        }

        Ok(())
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Settings::default().into()
    }
}

impl From<Settings> for ConnectionOptions {
    fn from(s: Settings) -> Self {
        Self {
            host: s.host,
            port: s.port,
            user: s.user,
            password: s.password,
            database: s.database,
            timeout: s.timeout,
            read_timeout: s.read_timeout,
            write_timeout: s.write_timeout,
            loc: s.loc,
            charset: s.charset,
            parse_time: s.parse_time,
            max_open_conns: s.max_open_conns,
            max_idle_conns: s.max_idle_conns,
            max_connection_lifetime: s.max_conn_lifetime,
            log_level: s.log_level,
            logger: Arc::new(TracingLogger::new()),
        }
    }
}

// Hand-written so the password never lands in logs.
impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("loc", &self.loc)
            .field("charset", &self.charset)
            .field("parse_time", &self.parse_time)
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_connection_lifetime", &self.max_connection_lifetime)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
