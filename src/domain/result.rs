//! Result type alias for trac2gitlab
//!
//! This module provides a convenient Result type alias that uses
//! `MigrationError` as the error type.

use super::errors::MigrationError;

/// Result type alias for migration operations
///
/// # Examples
///
/// ```
/// use trac2gitlab::domain::result::Result;
/// use trac2gitlab::domain::errors::MigrationError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(MigrationError::InvalidValue("unexpected array".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, MigrationError>;
