//! Engine error taxonomy.
//!
//! An API layer maps these one-to-one onto user-facing responses:
//! [`EngineError::NotFound`] → 404, [`EngineError::Conflict`] → 409
//! ("already handled", do not retry blindly), everything else → 500.
//! The engine never swallows an error into a silent default; the only
//! deliberate fallthrough lives in the policy crate (unknown type →
//! deny, not crash).

use caredesk_vault::Folder;

/// Unified error type for the workflow engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The filename is absent from the folder the operation targets.
    #[error("record `{filename}` not found in {folder}")]
    NotFound { filename: String, folder: Folder },

    /// A concurrent transition already moved the record; it now lives
    /// in `folder`. Treat as "already handled".
    #[error("record `{filename}` was already handled and is now in {folder}")]
    Conflict { filename: String, folder: Folder },

    /// The record is missing a field required for submission.
    #[error("record `{filename}` is not ready for approval: {source}")]
    NotReady {
        filename: String,
        source: caredesk_record::RecordError,
    },

    /// Propagated storage-layer failure (including mid-move
    /// `Transition` failures, which guarantee the record stayed in its
    /// source folder).
    #[error("vault error: {0}")]
    Vault(#[from] caredesk_vault::VaultError),

    /// A record on disk could not be parsed.
    #[error("record error: {0}")]
    Record(#[from] caredesk_record::RecordError),

    /// Auto-approval configuration is invalid; evaluation denies until
    /// it is fixed.
    #[error("config error: {0}")]
    Config(#[from] caredesk_policy::ConfigError),
}

impl EngineError {
    /// Whether this is the 404-equivalent case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the 409-equivalent case.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EngineError>;
