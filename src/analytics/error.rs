//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
///
/// The computation itself never fails; degenerate input is clamped or
/// skipped. These variants cover malformed arguments and the outer surfaces.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Structurally invalid reporting window
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Export failed
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidWindow(msg) => AppError::Validation(msg),
            AnalyticsError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            AnalyticsError::ExportFailed(msg) => AppError::Internal(format!("Export failed: {}", msg)),
        }
    }
}
