//! # caredesk-engine
//!
//! The approval workflow engine: the one component allowed to move
//! action records between lifecycle folders.
//!
//! Producers drop records into the intake folders; the engine submits
//! complete records for approval, consults the auto-approval policy
//! (capped by the hourly rate limiter), and exposes the decision
//! surface an HTTP layer or CLI sits on: list / get / approve / reject
//! / mark-executed, each returning a small serializable response.
//!
//! [`watch::InboxWatcher`] feeds filesystem events from `Inbox/` into
//! [`ApprovalEngine::notify_new_record`], which is idempotent for
//! duplicate notifications about the same file.

pub mod engine;
pub mod error;
pub mod summary;
pub mod watch;

// ── re-exports ───────────────────────────────────────────────────────

pub use engine::{ApprovalEngine, NotifyOutcome};
pub use error::{EngineError, Result};
pub use summary::{
    DecisionResponse, ExecutionResponse, FileSummary, FolderSummary, RawRecordView, SubmitResponse,
};
pub use watch::InboxWatcher;
