//! Vault error types.
//!
//! The taxonomy mirrors what an API layer maps to status codes:
//! [`VaultError::NotFound`] is the 404 case, [`VaultError::Conflict`]
//! the 409 case, and [`VaultError::Transition`] a storage move that
//! failed mid-operation (the record is guaranteed to remain visible in
//! exactly one folder, the source if cleanup could not complete).

use crate::folder::Folder;

/// Unified error type for the vault store.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The target filename is absent from the expected folder.
    #[error("record `{filename}` not found in {folder}")]
    NotFound { filename: String, folder: Folder },

    /// The same filename already exists elsewhere in the vault, or the
    /// record was already moved by a concurrent transition.
    #[error("record `{filename}` already exists in {folder}")]
    Conflict { filename: String, folder: Folder },

    /// A storage move failed partway; the record was left in `folder`.
    #[error("transition of `{filename}` failed, record left in {folder}: {reason}")]
    Transition {
        filename: String,
        folder: Folder,
        reason: String,
    },

    /// The folder name is not one of the five lifecycle folders.
    #[error("unknown folder: `{0}`")]
    UnknownFolder(String),

    /// Producers may only create records in the intake folders;
    /// Approved and Done are written exclusively by the engine.
    #[error("new records may not be created directly in {0}")]
    NotIntake(Folder),

    /// A record on disk could not be parsed.
    #[error("record error: {0}")]
    Record(#[from] caredesk_record::RecordError),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, VaultError>;
