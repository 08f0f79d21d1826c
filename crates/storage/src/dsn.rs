//! Connection string in the MySQL driver's DSN form:
//!
//! ```text
//! user:password@tcp(host:port)/db?charset=..&parseTime=..&loc=..&timeout=..&readTimeout=..&writeTimeout=..
//! ```
//!
//! Values are written verbatim and in that fixed order.

use std::{fmt, str::FromStr};

use sqlx::{ConnectOptions, mysql::MySqlConnectOptions};

use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub charset: String,
    pub parse_time: bool,
    pub loc: String,
    pub timeout: String,
    pub read_timeout: String,
    pub write_timeout: String,
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@tcp({}:{})/{}?charset={}&parseTime={}&loc={}&timeout={}&readTimeout={}&writeTimeout={}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.database,
            self.charset,
            self.parse_time,
            self.loc,
            self.timeout,
            self.read_timeout,
            self.write_timeout,
        )
    }
}

fn malformed(msg: impl Into<String>) -> DbError {
    DbError::MalformedDsn(msg.into())
}

impl FromStr for Dsn {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, DbError> {
        let (credentials, rest) = s
            .rsplit_once("@tcp(")
            .ok_or_else(|| malformed("missing `@tcp(` address"))?;
        let (user, password) = credentials
            .split_once(':')
            .ok_or_else(|| malformed("missing `user:password`"))?;
        let (address, rest) = rest
            .split_once(")/")
            .ok_or_else(|| malformed("unterminated address"))?;
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| malformed("address has no port"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| malformed(format!("invalid port {port:?}")))?;
        let (database, query) = rest
            .split_once('?')
            .ok_or_else(|| malformed("missing parameters"))?;

        let mut charset = None;
        let mut parse_time = None;
        let mut loc = None;
        let mut timeout = None;
        let mut read_timeout = None;
        let mut write_timeout = None;

        for pair in query.split('&') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| malformed(format!("parameter {pair:?} has no value")))?;
            let value = value.to_string();
            match key {
                "charset" => charset = Some(value),
                "parseTime" => {
                    parse_time = Some(match value.as_str() {
                        "true" => true,
                        "false" => false,
                        other => return Err(malformed(format!("parseTime={other}"))),
                    })
                }
                "loc" => loc = Some(value),
                "timeout" => timeout = Some(value),
                "readTimeout" => read_timeout = Some(value),
                "writeTimeout" => write_timeout = Some(value),
                other => return Err(malformed(format!("unknown parameter {other:?}"))),
            }
        }

        let required = |value: Option<String>, key: &str| {
            value.ok_or_else(|| malformed(format!("missing parameter {key:?}")))
        };

        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            database: database.to_string(),
            charset: required(charset, "charset")?,
            parse_time: parse_time.ok_or_else(|| malformed("missing parameter \"parseTime\""))?,
            loc: required(loc, "loc")?,
            timeout: required(timeout, "timeout")?,
            read_timeout: required(read_timeout, "readTimeout")?,
            write_timeout: required(write_timeout, "writeTimeout")?,
        })
    }
}

/// `SET time_zone` value for a location name. `Local` leaves the server's
/// zone in place.
fn session_time_zone(loc: &str) -> Option<String> {
    match loc {
        "Local" => None,
        "UTC" => Some("+00:00".to_string()),
        other => Some(other.to_string()),
    }
}

impl Dsn {
    /// Driver options for this DSN. Statement logging in sqlx is switched
    /// off; statements are reported through the handle's own sink.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut opts = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .charset(&self.charset)
            .timezone(session_time_zone(&self.loc));
        if !self.password.is_empty() {
            opts = opts.password(&self.password);
        }
        opts.disable_statement_logging()
    }

    /// Same as [`Display`](fmt::Display) but with the password masked.
    pub fn redacted(&self) -> String {
        let masked = Self {
            password: "***".to_string(),
            ..self.clone()
        };
        masked.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Dsn {
        Dsn {
            user: "root".into(),
            password: "pw".into(),
            host: "127.0.0.1".into(),
            port: 3306,
            database: "app".into(),
            charset: "utf8mb4".into(),
            parse_time: true,
            loc: "Local".into(),
            timeout: "10s".into(),
            read_timeout: "30s".into(),
            write_timeout: "30s".into(),
        }
    }

    #[test]
    fn renders_fixed_template() {
        assert_eq!(
            example().to_string(),
            "root:pw@tcp(127.0.0.1:3306)/app?charset=utf8mb4&parseTime=true&loc=Local&timeout=10s&readTimeout=30s&writeTimeout=30s"
        );
    }

    #[test]
    fn parse_time_maps_to_literal() {
        let mut dsn = example();
        dsn.parse_time = false;
        assert!(dsn.to_string().contains("&parseTime=false&"));
    }

    #[test]
    fn fields_appear_in_order() {
        let dsn = Dsn {
            user: "u_x".into(),
            password: "p_x".into(),
            host: "db.example".into(),
            port: 4406,
            database: "d_x".into(),
            charset: "latin1".into(),
            parse_time: false,
            loc: "Asia/Shanghai".into(),
            timeout: "1s".into(),
            read_timeout: "2s".into(),
            write_timeout: "3s".into(),
        };
        let text = dsn.to_string();
        let positions: Vec<usize> = [
            "u_x",
            "p_x",
            "db.example",
            "4406",
            "d_x",
            "latin1",
            "parseTime=false",
            "Asia/Shanghai",
            "timeout=1s",
            "readTimeout=2s",
            "writeTimeout=3s",
        ]
        .iter()
        .map(|needle| {
            assert_eq!(text.matches(needle).count(), 1, "{needle} should appear once");
            text.find(needle).unwrap()
        })
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn parses_back_to_the_same_fields() {
        let mut dsn = example();
        dsn.password = "p@ss:word".into();
        dsn.loc = "Europe/Berlin".into();
        let parsed: Dsn = dsn.to_string().parse().unwrap();
        assert_eq!(parsed, dsn);
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in [
            "root@localhost/app",
            "root:pw@tcp(127.0.0.1)/app?charset=utf8",
            "root:pw@tcp(127.0.0.1:notaport)/app?charset=utf8",
            "root:pw@tcp(127.0.0.1:3306)/app",
            "root:pw@tcp(127.0.0.1:3306)/app?charset=utf8mb4&parseTime=yes&loc=Local&timeout=1s&readTimeout=1s&writeTimeout=1s",
            "root:pw@tcp(127.0.0.1:3306)/app?charset=utf8mb4&parseTime=true&loc=Local&timeout=1s&readTimeout=1s",
            "root:pw@tcp(127.0.0.1:3306)/app?charset=utf8mb4&parseTime=true&loc=Local&timeout=1s&readTimeout=1s&writeTimeout=1s&tls=true",
        ] {
            let err = bad.parse::<Dsn>().unwrap_err();
            assert!(matches!(err, DbError::MalformedDsn(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn redacted_masks_password_only() {
        let text = example().redacted();
        assert!(text.starts_with("root:***@tcp(127.0.0.1:3306)/app?"));
        assert!(!text.contains(":pw@"));
    }

    #[test]
    fn connect_options_carry_address_and_account() {
        let opts = example().connect_options();
        assert_eq!(opts.get_host(), "127.0.0.1");
        assert_eq!(opts.get_port(), 3306);
        assert_eq!(opts.get_username(), "root");
        assert_eq!(opts.get_database(), Some("app"));
        assert_eq!(opts.get_charset(), "utf8mb4");
    }

    #[test]
    fn local_zone_defers_to_server() {
        assert_eq!(session_time_zone("Local"), None);
        assert_eq!(session_time_zone("UTC").as_deref(), Some("+00:00"));
        assert_eq!(
            session_time_zone("Asia/Shanghai").as_deref(),
            Some("Asia/Shanghai")
        );
    }
}
