//! Convenience result type alias for AccessGate.

use crate::error::AppError;

/// A specialized `Result` type for AccessGate operations.
pub type AppResult<T> = Result<T, AppError>;
