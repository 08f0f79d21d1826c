use std::sync::{PoisonError, RwLock};

use crate::{error::DbError, handle::Db, options::ConnectionOptions};

/// Holds the one shared [`Db`] handle of a process.
///
/// Starts uninitialized; the first successful [`initialize`](Self::initialize)
/// makes it ready and there is no way back. A later successful call replaces
/// the handle wholesale; a failed call leaves whatever was published before.
#[derive(Debug)]
pub struct ConnectionManager {
    current: RwLock<Option<Db>>,
}

impl ConnectionManager {
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Open a pool for `options` and publish it.
    pub async fn initialize(&self, options: &ConnectionOptions) -> Result<(), DbError> {
        let db = Db::open(options).await?;
        self.publish(db);
        Ok(())
    }

    /// Publish an already opened handle.
    pub fn publish(&self, db: Db) {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(db);
    }

    /// Debug view of the published handle: every statement is reported to
    /// the sink. The stored handle keeps its configured level.
    pub fn current(&self) -> Result<Db, DbError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Db::debug)
            .ok_or(DbError::NotInitialized)
    }

    pub fn is_ready(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: ConnectionManager = ConnectionManager::new();

/// Initialise the process-wide connection. Call once during startup.
pub async fn init(options: &ConnectionOptions) -> Result<(), DbError> {
    GLOBAL.initialize(options).await
}

/// The process-wide connection, with verbose statement logging.
pub fn get_db() -> Result<Db, DbError> {
    GLOBAL.current()
}

/// The manager behind [`init`] and [`get_db`].
pub fn global() -> &'static ConnectionManager {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::logger::LogLevel;

    fn options(max_open: u32, max_idle: u32) -> ConnectionOptions {
        ConnectionOptions {
            max_open_conns: max_open,
            max_idle_conns: max_idle,
            max_connection_lifetime: Duration::from_secs(3600),
            log_level: LogLevel::Warn,
            ..ConnectionOptions::default()
        }
    }

    #[test]
    fn uninitialized_manager_reports_not_initialized() {
        let manager = ConnectionManager::new();
        assert!(!manager.is_ready());
        assert!(matches!(manager.current(), Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn published_handle_is_returned_in_debug_mode() {
        let manager = ConnectionManager::new();
        manager.publish(Db::open_lazy(&options(50, 10)).unwrap());

        assert!(manager.is_ready());
        let db = manager.current().unwrap();
        assert_eq!(db.log_level(), LogLevel::Info);
        assert_eq!(db.limits().max_open, 50);
        assert_eq!(db.limits().max_idle, 10);
        assert_eq!(db.limits().max_lifetime, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn later_publish_replaces_the_handle() {
        let manager = ConnectionManager::new();
        manager.publish(Db::open_lazy(&options(50, 10)).unwrap());
        manager.publish(Db::open_lazy(&options(8, 2)).unwrap());

        let limits = manager.current().unwrap().limits();
        assert_eq!((limits.max_open, limits.max_idle), (8, 2));
    }

    #[tokio::test]
    async fn failed_initialize_leaves_manager_uninitialized() {
        let manager = ConnectionManager::new();

        let mut bad = options(50, 10);
        bad.host = "invalid-host".into();
        bad.port = 0;
        assert!(manager.initialize(&bad).await.is_err());
        assert!(matches!(manager.current(), Err(DbError::NotInitialized)));

        let mut refused = options(50, 10);
        refused.port = 1;
        refused.timeout = "500ms".into();
        let err = manager.initialize(&refused).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionOpen(_)), "{err:?}");
        assert!(!manager.is_ready());
    }

    #[tokio::test]
    async fn failed_initialize_keeps_previous_handle() {
        let manager = ConnectionManager::new();
        manager.publish(Db::open_lazy(&options(12, 3)).unwrap());

        let mut refused = options(50, 10);
        refused.port = 1;
        refused.timeout = "500ms".into();
        assert!(manager.initialize(&refused).await.is_err());

        assert_eq!(manager.current().unwrap().limits().max_open, 12);
    }
}
