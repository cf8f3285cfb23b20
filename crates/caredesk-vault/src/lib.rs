//! # caredesk-vault
//!
//! The lifecycle folder store. A vault is a root directory holding five
//! fixed folders — `Inbox/`, `Needs_Action/`, `Pending_Approval/`,
//! `Approved/`, `Done/` — and moving a record file between them IS the
//! state transition.
//!
//! All mutation funnels through [`VaultStore`]: producers create records
//! into the intake folders, and every transition runs through the single
//! [`VaultStore::transition`] primitive, which performs the storage move
//! and the metadata patch as one logical operation with defined rollback
//! behavior. A filename exists in at most one folder at any time; the
//! store refuses to create or move a record into a duplicate.

pub mod error;
pub mod folder;
pub mod store;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{Result, VaultError};
pub use folder::Folder;
pub use store::VaultStore;
