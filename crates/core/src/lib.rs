pub mod config;
pub mod duration;
pub mod error;
pub mod telemetry;

pub use config::{LogLevel, Settings};
pub use error::AppError;
