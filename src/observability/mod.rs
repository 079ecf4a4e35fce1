//! Observability for the harness
//!
//! Timestamped log lines for every protocol event and operation outcome.

pub mod logging;

// Re-export for convenience
pub use logging::{
    init_default_logging, init_logging, render_entry, EventLog, LogFormat, TracingLog,
};
