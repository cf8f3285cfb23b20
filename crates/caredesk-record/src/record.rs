//! The action record entity.
//!
//! [`ActionRecord`] is a typed view of one vault file: every lifecycle
//! field is explicit, so required-field validation per stage is
//! exhaustive instead of probing an open-ended map. The `with_*`
//! updaters return modified copies; the caller persists the result
//! through the vault store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{RecordError, Result};
use crate::types::{ActionType, Outcome, RiskCategory, Urgency};

/// One candidate real-world action moving through the approval lifecycle.
///
/// Serializes to JSON for API-facing views; the on-disk form is the
/// frontmatter codec in [`crate::codec`], not serde.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// Identity: the vault filename, stable across folder moves.
    pub filename: String,

    /// Human-readable title. Required before a record may enter
    /// Pending_Approval.
    pub title: Option<String>,

    /// Action category. Required before a record may enter
    /// Pending_Approval.
    #[serde(rename = "type")]
    pub action_type: Option<ActionType>,

    /// When the record was created / submitted.
    pub created: Option<DateTime<Utc>>,

    /// Time criticality. Defaults to normal when absent.
    pub urgency: Urgency,

    /// Producer-assigned patient risk band. Defaults to low when absent.
    pub risk_category: RiskCategory,

    // -- Stamped on transition ----------------------------------------------
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_notes: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub execution_notes: Option<String>,
    pub outcome: Option<Outcome>,

    /// Free-text body — the message draft or action description. Opaque
    /// to the workflow engine.
    pub body: String,
}

impl ActionRecord {
    /// Create a new record with a slug filename derived from the title.
    pub fn new(title: impl Into<String>, action_type: ActionType) -> Self {
        let title = title.into();
        Self {
            filename: slugify(&title),
            title: Some(title),
            action_type: Some(action_type),
            created: None,
            urgency: Urgency::default(),
            risk_category: RiskCategory::default(),
            approved_at: None,
            approval_notes: None,
            rejected_at: None,
            rejection_notes: None,
            executed_at: None,
            execution_notes: None,
            outcome: None,
            body: String::new(),
        }
    }

    /// Create an empty record for a filename whose metadata comes from
    /// parsing. Used by the codec.
    pub(crate) fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: None,
            action_type: None,
            created: None,
            urgency: Urgency::default(),
            risk_category: RiskCategory::default(),
            approved_at: None,
            approval_notes: None,
            rejected_at: None,
            rejection_notes: None,
            executed_at: None,
            execution_notes: None,
            outcome: None,
            body: String::new(),
        }
    }

    // -- Builder-style updaters ---------------------------------------------

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the urgency.
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Set the patient risk category.
    pub fn with_risk_category(mut self, risk: RiskCategory) -> Self {
        self.risk_category = risk;
        self
    }

    /// Stamp the creation timestamp if not already set.
    pub fn with_created(mut self, at: DateTime<Utc>) -> Self {
        if self.created.is_none() {
            self.created = Some(truncate_to_secs(at));
        }
        self
    }

    /// Stamp approval metadata (PendingApproval → Approved).
    pub fn with_approval(mut self, at: DateTime<Utc>, notes: impl Into<String>) -> Self {
        self.approved_at = Some(truncate_to_secs(at));
        self.approval_notes = Some(notes.into());
        self
    }

    /// Stamp rejection metadata (PendingApproval → Done).
    pub fn with_rejection(mut self, at: DateTime<Utc>, notes: impl Into<String>) -> Self {
        self.rejected_at = Some(truncate_to_secs(at));
        self.rejection_notes = Some(notes.into());
        self.outcome = Some(Outcome::Rejected);
        self
    }

    /// Stamp execution metadata (Approved → Done).
    pub fn with_execution(mut self, at: DateTime<Utc>, notes: impl Into<String>) -> Self {
        self.executed_at = Some(truncate_to_secs(at));
        self.execution_notes = Some(notes.into());
        self.outcome = Some(Outcome::Executed);
        self
    }

    // -- Validation ---------------------------------------------------------

    /// Check the fields required before a record may enter
    /// Pending_Approval: `title` and `type`.
    pub fn require_approval_fields(&self) -> Result<()> {
        if self.title.as_deref().is_none_or(str::is_empty) {
            return Err(RecordError::MissingField { field: "title" });
        }
        if self.action_type.is_none() {
            return Err(RecordError::MissingField { field: "type" });
        }
        Ok(())
    }

    /// The parsed title, or the filename stem as a fallback for display.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => self.filename.trim_end_matches(".md"),
        }
    }
}

/// Derive a vault filename from a record title: lowercase, runs of
/// non-alphanumeric characters collapse to a single underscore, `.md`
/// suffix. "Test Approval" becomes `test_approval.md`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len() + 3);
    let mut last_was_sep = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug.push_str(".md");
    slug
}

/// Frontmatter timestamps carry second precision, so every stamp is
/// truncated up front to keep parse(serialize(r)) == r.
fn truncate_to_secs(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Render a timestamp the way frontmatter stores it.
pub(crate) fn format_ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
