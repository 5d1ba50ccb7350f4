//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - human-readable console output
//! - optional JSON log files with rotation
//! - level set from config, CLI or `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use trac2gitlab::logging::init_logging;
//! use trac2gitlab::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(ticket_id = 42, "Ticket exported");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a record that was skipped after a failure
///
/// # Example
///
/// ```no_run
/// use trac2gitlab::log_record_skipped;
/// use trac2gitlab::domain::MigrationError;
///
/// let error = MigrationError::Io("disk full".to_string());
/// log_record_skipped!("ticket", 42, &error);
/// ```
#[macro_export]
macro_rules! log_record_skipped {
    ($kind:expr, $key:expr, $error:expr) => {
        tracing::warn!(
            kind = $kind,
            key = %$key,
            error = %$error,
            "Record skipped"
        )
    };
}

/// Log the completion of a pipeline phase
///
/// # Example
///
/// ```no_run
/// use trac2gitlab::log_phase_complete;
/// use std::time::Duration;
///
/// log_phase_complete!("tickets", 120, Duration::from_secs(9));
/// ```
#[macro_export]
macro_rules! log_phase_complete {
    ($phase:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            phase = $phase,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Phase completed"
        )
    };
}
