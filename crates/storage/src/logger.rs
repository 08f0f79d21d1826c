//! Pluggable sink for statement diagnostics.
//!
//! The handle never writes log output itself. It classifies each statement
//! it runs, filters by its [`LogLevel`], and hands what survives to the
//! injected [`SqlLogger`]. [`TracingLogger`] is the default backend.

use std::time::Duration;

pub use mysqlink_core::LogLevel;

/// Statements slower than this are reported as slow by default.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(200);

/// How a finished statement is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Failed,
    Slow,
    Completed,
}

impl TraceKind {
    /// Lowest level at which a statement of this kind reaches the sink.
    pub fn min_level(self) -> LogLevel {
        match self {
            Self::Failed => LogLevel::Error,
            Self::Slow => LogLevel::Warn,
            Self::Completed => LogLevel::Info,
        }
    }
}

/// One executed statement.
#[derive(Debug, Clone, Copy)]
pub struct StatementEvent<'a> {
    pub sql: &'a str,
    pub rows_affected: Option<u64>,
    pub elapsed: Duration,
    pub error: Option<&'a sqlx::Error>,
}

impl StatementEvent<'_> {
    pub fn kind(&self, slow_threshold: Duration) -> TraceKind {
        if self.error.is_some() {
            TraceKind::Failed
        } else if !slow_threshold.is_zero() && self.elapsed > slow_threshold {
            TraceKind::Slow
        } else {
            TraceKind::Completed
        }
    }

    /// Classify the event and decide whether `level` lets it through.
    pub fn filter(&self, level: LogLevel, slow_threshold: Duration) -> Option<TraceKind> {
        let kind = self.kind(slow_threshold);
        (level >= kind.min_level()).then_some(kind)
    }
}

/// Structured logging capability wired into a [`Db`](crate::Db) handle.
pub trait SqlLogger: Send + Sync + 'static {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Report a statement that already passed level filtering.
    fn trace(&self, kind: TraceKind, event: &StatementEvent<'_>);

    fn slow_threshold(&self) -> Duration {
        DEFAULT_SLOW_THRESHOLD
    }
}

/// Sink that emits `tracing` events under the `mysqlink::sql` target.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    slow_threshold: Duration,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self {
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }

    /// Zero disables slow-statement reporting.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "mysqlink::sql", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "mysqlink::sql", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "mysqlink::sql", "{message}");
    }

    fn trace(&self, kind: TraceKind, event: &StatementEvent<'_>) {
        let elapsed_ms = event.elapsed.as_secs_f64() * 1_000.0;
        let rows = event.rows_affected;
        match kind {
            TraceKind::Failed => tracing::error!(
                target: "mysqlink::sql",
                sql = event.sql,
                rows,
                elapsed_ms,
                error = event.error.map(tracing::field::display),
                "statement failed"
            ),
            TraceKind::Slow => tracing::warn!(
                target: "mysqlink::sql",
                sql = event.sql,
                rows,
                elapsed_ms,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "slow statement"
            ),
            TraceKind::Completed => tracing::info!(
                target: "mysqlink::sql",
                sql = event.sql,
                rows,
                elapsed_ms,
                "statement"
            ),
        }
    }

    fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(elapsed_ms: u64, error: Option<&sqlx::Error>) -> StatementEvent<'_> {
        StatementEvent {
            sql: "SELECT 1",
            rows_affected: Some(1),
            elapsed: Duration::from_millis(elapsed_ms),
            error,
        }
    }

    #[test]
    fn classifies_failed_slow_and_completed() {
        let err = sqlx::Error::PoolClosed;
        assert_eq!(event(1, Some(&err)).kind(DEFAULT_SLOW_THRESHOLD), TraceKind::Failed);
        assert_eq!(event(500, None).kind(DEFAULT_SLOW_THRESHOLD), TraceKind::Slow);
        assert_eq!(event(5, None).kind(DEFAULT_SLOW_THRESHOLD), TraceKind::Completed);
        // zero threshold turns slow detection off
        assert_eq!(event(500, None).kind(Duration::ZERO), TraceKind::Completed);
    }

    #[test]
    fn level_gates_what_reaches_the_sink() {
        let err = sqlx::Error::PoolClosed;
        let failed = event(1, Some(&err));
        let slow = event(500, None);
        let quick = event(5, None);
        let t = DEFAULT_SLOW_THRESHOLD;

        assert_eq!(failed.filter(LogLevel::Silent, t), None);
        assert_eq!(failed.filter(LogLevel::Error, t), Some(TraceKind::Failed));

        assert_eq!(slow.filter(LogLevel::Error, t), None);
        assert_eq!(slow.filter(LogLevel::Warn, t), Some(TraceKind::Slow));

        assert_eq!(quick.filter(LogLevel::Warn, t), None);
        assert_eq!(quick.filter(LogLevel::Info, t), Some(TraceKind::Completed));
    }

    #[test]
    fn tracing_logger_threshold_is_configurable() {
        assert_eq!(TracingLogger::new().slow_threshold(), DEFAULT_SLOW_THRESHOLD);
        let logger = TracingLogger::new().with_slow_threshold(Duration::from_secs(1));
        assert_eq!(logger.slow_threshold(), Duration::from_secs(1));
    }
}
