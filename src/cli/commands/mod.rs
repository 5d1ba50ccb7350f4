//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | completed with record-level failures |
//! | 2 | configuration error |
//! | 4 | connection error |
//! | 5 | fatal error |
//! | 130 | interrupted by a shutdown signal |

pub mod check;
pub mod export;
pub mod init;
pub mod migrate;
pub mod validate;

/// Exit code of a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code when some records failed
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code of a configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when a remote system cannot be reached
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code of any other failure
pub const EXIT_FATAL: i32 = 5;
/// Exit code after SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;
