//! # caredesk-record
//!
//! Action record entity and on-disk codec for CareDesk.
//!
//! An *action record* is one candidate real-world action — a message to
//! send, a reminder, an invoice — written as a markdown file with a
//! frontmatter metadata block and a free-text body. The filename (a slug
//! derived from the title) is the record's identity and stays stable as
//! the record moves through the approval lifecycle.
//!
//! This crate provides:
//!
//! - **Typed metadata** — [`ActionType`], [`Urgency`], [`RiskCategory`],
//!   and [`Outcome`] enums, plus the [`ActionRecord`] entity with explicit
//!   optional fields per lifecycle stage.
//!
//! - **Codec** — [`codec::parse`] and [`codec::serialize`], round-trip
//!   stable for every record this crate produces.
//!
//! The workflow engine treats the body as opaque; only the frontmatter
//! participates in approval decisions.

pub mod codec;
pub mod error;
pub mod record;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use codec::{parse, serialize};
pub use error::{RecordError, Result};
pub use record::{ActionRecord, slugify};
pub use types::{ActionType, Outcome, RiskCategory, Urgency};
