//! Observability: structured logging for degraded conditions.

mod logger;

pub use logger::{Logger, Severity};
