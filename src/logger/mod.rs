//! Log record construction and asynchronous dispatch.

mod builder;
mod handle;
mod record;
mod stats;

pub use builder::LoggerBuilder;
pub use handle::{ConfigOrigin, Logger};
pub use record::{LogRecord, TIMESTAMP_FORMAT};
pub use stats::DispatchStats;
