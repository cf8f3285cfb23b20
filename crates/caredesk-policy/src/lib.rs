//! # caredesk-policy
//!
//! The auto-approval policy: decides, without side effects, whether an
//! action record may skip human review.
//!
//! Three pieces:
//!
//! - [`AutoApprovalConfig`] — an explicit configuration struct built once
//!   from environment variables and passed into every evaluation. Decision
//!   logic never reads the environment ad hoc.
//!
//! - [`decide`] — the pure decision function. Identical inputs always
//!   produce the identical [`Verdict`]; every deny path carries a reason.
//!
//! - [`RateLimiter`] — the hourly auto-approval cap, kept out of the pure
//!   function because it needs mutable, monotonic-clock state. The
//!   workflow engine consults it after a positive verdict.

pub mod config;
pub mod decide;
pub mod error;
pub mod rate_limit;

// ── re-exports ───────────────────────────────────────────────────────

pub use config::AutoApprovalConfig;
pub use decide::{Verdict, decide};
pub use error::{ConfigError, Result};
pub use rate_limit::RateLimiter;
