//! Configuration error types.
//!
//! A configuration problem is always fail-safe: callers that cannot
//! build a valid [`crate::AutoApprovalConfig`] must deny auto-approval,
//! never fail open.

/// Invalid or unparseable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse as the
    /// expected type.
    #[error("invalid value for {var}: `{value}` ({expected})")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConfigError>;
