use std::{fmt, str::FromStr, time::Duration};

use serde::Deserialize;

use crate::{duration, error::AppError};

/// Verbosity of statement logging, ordered from quietest to loudest.
///
/// The numeric forms `1..=4` are accepted wherever a level is parsed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent = 1,
    Error = 2,
    #[default]
    Warn = 3,
    Info = 4,
}

impl LogLevel {
    pub fn from_number(value: i32) -> Result<Self, AppError> {
        match value {
            1 => Ok(Self::Silent),
            2 => Ok(Self::Error),
            3 => Ok(Self::Warn),
            4 => Ok(Self::Info),
            other => Err(AppError::Config(format!("log level out of range: {other}"))),
        }
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            other => other
                .parse::<i32>()
                .map_err(|_| AppError::Config(format!("unknown log level: {s}")))
                .and_then(Self::from_number),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Silent => "silent",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
        };
        f.write_str(name)
    }
}

/// MySQL connection settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Server host name or IP address.
    pub host: String,

    /// Server TCP port.
    pub port: u16,

    pub user: String,

    pub password: String,

    /// Schema to select after connecting.
    pub database: String,

    pub charset: String,

    /// Whether DATE/DATETIME columns decode into native time values.
    pub parse_time: bool,

    /// Time zone location name (`Local`, `UTC`, `Asia/Shanghai`, ...).
    pub loc: String,

    /// Dial timeout, as duration text.
    pub timeout: String,

    pub read_timeout: String,

    pub write_timeout: String,

    /// Upper bound on open connections in the pool.
    pub max_open_conns: u32,

    /// Upper bound on idle connections kept by the pool.
    pub max_idle_conns: u32,

    /// How long a connection may be reused. Zero means forever.
    pub max_conn_lifetime: Duration,

    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3306,
            user: "root".into(),
            password: String::new(),
            database: "app".into(),
            charset: "utf8mb4".into(),
            parse_time: true,
            loc: "Local".into(),
            timeout: "10s".into(),
            read_timeout: "30s".into(),
            write_timeout: "30s".into(),
            max_open_conns: 50,
            max_idle_conns: 10,
            max_conn_lifetime: Duration::from_secs(3600),
            log_level: LogLevel::Warn,
        }
    }
}

fn parse_field<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}")))
}

impl Settings {
    /// Load settings from environment variables (with optional `.env` file).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup. Missing keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(v) = lookup("DB_HOST") {
            settings.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            settings.port = parse_field("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("DB_USER") {
            settings.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            settings.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            settings.database = v;
        }
        if let Some(v) = lookup("DB_CHARSET") {
            settings.charset = v;
        }
        if let Some(v) = lookup("DB_PARSE_TIME") {
            settings.parse_time = parse_field("DB_PARSE_TIME", &v)?;
        }
        if let Some(v) = lookup("DB_LOC") {
            settings.loc = v;
        }
        if let Some(v) = lookup("DB_TIMEOUT") {
            settings.timeout = v;
        }
        if let Some(v) = lookup("DB_READ_TIMEOUT") {
            settings.read_timeout = v;
        }
        if let Some(v) = lookup("DB_WRITE_TIMEOUT") {
            settings.write_timeout = v;
        }
        if let Some(v) = lookup("DB_MAX_OPEN_CONNS") {
            settings.max_open_conns = parse_field("DB_MAX_OPEN_CONNS", &v)?;
        }
        if let Some(v) = lookup("DB_MAX_IDLE_CONNS") {
            settings.max_idle_conns = parse_field("DB_MAX_IDLE_CONNS", &v)?;
        }
        if let Some(v) = lookup("DB_MAX_CONN_LIFETIME") {
            settings.max_conn_lifetime = duration::parse(&v)?;
        }
        if let Some(v) = lookup("DB_LOG_LEVEL") {
            settings.log_level = v.parse()?;
        }

        Ok(settings)
    }
}
