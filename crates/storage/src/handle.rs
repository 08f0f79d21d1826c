use std::{fmt, sync::Arc, time::Instant};

use sqlx::{
    MySql, Pool,
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
};

use crate::{
    error::DbError,
    logger::{LogLevel, SqlLogger, StatementEvent},
    options::{ConnectionOptions, PoolLimits},
    session::SessionConfig,
};

/// Pool options for the given limits, applied in the order max open
/// connections, max lifetime, then idle bound.
///
/// sqlx has no direct cap on idle connections; the idle bound is kept on
/// the handle and reported through [`Db::limits`]. With an idle bound of
/// zero, connections are not kept warm at all.
pub(crate) fn pool_options(
    limits: PoolLimits,
    connect_timeout: std::time::Duration,
) -> MySqlPoolOptions {
    let lifetime = (!limits.max_lifetime.is_zero()).then_some(limits.max_lifetime);
    let mut opts = MySqlPoolOptions::new()
        .max_connections(limits.max_open)
        .max_lifetime(lifetime)
        .min_connections(0)
        .acquire_timeout(connect_timeout);
    if limits.max_idle == 0 {
        opts = opts.idle_timeout(Some(std::time::Duration::from_secs(1)));
    }
    opts
}

/// Live pooled connection plus the session behaviour it was opened with.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct Db {
    pool: MySqlPool,
    session: SessionConfig,
    limits: PoolLimits,
    log_level: LogLevel,
    logger: Arc<dyn SqlLogger>,
}

impl Db {
    /// Open the pool described by `options`.
    ///
    /// Driver errors come back as-is: [`DbError::ConnectionOpen`] when the
    /// pool cannot connect, [`DbError::HandleRetrieval`] when it connects
    /// but cannot hand out a connection.
    pub async fn open(options: &ConnectionOptions) -> Result<Self, DbError> {
        options.validate()?;
        let connect = options.dsn().connect_options();
        let pool = pool_options(options.limits(), options.connect_timeout()?)
            .connect_with(connect)
            .await
            .map_err(DbError::ConnectionOpen)?;

        let conn = pool.acquire().await.map_err(DbError::HandleRetrieval)?;
        drop(conn);

        Ok(Self::from_pool(pool, options))
    }

    /// Build a handle without connecting. The first statement dials the
    /// server.
    pub fn open_lazy(options: &ConnectionOptions) -> Result<Self, DbError> {
        options.validate()?;
        let connect: MySqlConnectOptions = options.dsn().connect_options();
        let pool = pool_options(options.limits(), options.connect_timeout()?)
            .connect_lazy_with(connect);
        Ok(Self::from_pool(pool, options))
    }

    fn from_pool(pool: MySqlPool, options: &ConnectionOptions) -> Self {
        Self {
            pool,
            session: SessionConfig::default(),
            limits: options.limits(),
            log_level: options.log_level,
            logger: Arc::clone(&options.logger),
        }
    }

    /// Handle that reports every statement. `self` keeps its own level.
    pub fn debug(&self) -> Self {
        Self {
            log_level: LogLevel::Info,
            ..self.clone()
        }
    }

    pub fn pool(&self) -> &Pool<MySql> {
        &self.pool
    }

    pub fn limits(&self) -> PoolLimits {
        self.limits
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn logger(&self) -> &dyn SqlLogger {
        self.logger.as_ref()
    }

    /// Run a single statement and return the affected row count.
    ///
    /// Unless the session skips default transactions, the statement runs
    /// inside its own transaction.
    pub async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let started = Instant::now();
        let result = if self.session.skip_default_transaction {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map(|done| done.rows_affected())
        } else {
            self.execute_in_transaction(sql).await
        };
        self.report(sql, started, &result);
        result.map_err(DbError::Statement)
    }

    async fn execute_in_transaction(&self, sql: &str) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(sql).execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;
        Ok(rows)
    }

    /// Round-trip `SELECT 1` through the pool.
    pub async fn ping(&self) -> Result<(), DbError> {
        const SQL: &str = "SELECT 1";
        let started = Instant::now();
        let result = sqlx::query_scalar::<_, i64>(SQL)
            .fetch_one(&self.pool)
            .await
            .map(|_| 1);
        self.report(SQL, started, &result);
        result.map(|_| ()).map_err(DbError::Statement)
    }

    fn report(&self, sql: &str, started: Instant, result: &Result<u64, sqlx::Error>) {
        let event = StatementEvent {
            sql,
            rows_affected: result.as_ref().ok().copied(),
            elapsed: started.elapsed(),
            error: result.as_ref().err(),
        };
        if let Some(kind) = event.filter(self.log_level, self.logger.slow_threshold()) {
            self.logger.trace(kind, &event);
        }
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("limits", &self.limits)
            .field("log_level", &self.log_level)
            .field("session", &self.session)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}
