//! mysqlink probe — opens the shared MySQL connection from environment
//! settings and checks that it answers.
//!
//! Reads `DB_*` variables (or `.env`), initialises the process-wide handle,
//! pings through the verbose debug handle and reports the pool limits.

use eyre::Result;
use mysqlink_core::{Settings, duration, telemetry};
use mysqlink_storage::{self as storage, ConnectionOptions};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let settings = Settings::from_env()?;
    let options = ConnectionOptions::from(settings);

    tracing::info!(dsn = %options.dsn().redacted(), "Opening MySQL connection");

    storage::init(&options).await?;
    let db = storage::get_db()?;
    db.ping().await?;

    let limits = db.limits();
    tracing::info!(
        max_open = limits.max_open,
        max_idle = limits.max_idle,
        max_lifetime = %duration::format(limits.max_lifetime),
        pool_size = db.pool().size(),
        "Database ready"
    );
    db.logger().info("probe finished");

    Ok(())
}
