//! The approval workflow engine.
//!
//! State machine (folder = state):
//!
//! ```text
//! Inbox ──────────────┐
//!                     ├─ submit ──► Pending_Approval ──┬─ approve ──► Approved ── execute ──► Done
//! Needs_Action ───────┘            (auto-approval may    └─ reject ─────────────────────────► Done
//!                                   fire here)
//! ```
//!
//! Every move runs through the vault store's single transition
//! primitive, so atomicity, conflict detection, and rollback live in
//! one place. Transitions on different records are unordered; on the
//! same record the storage move serializes them and the loser surfaces
//! as [`EngineError::Conflict`].

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use caredesk_policy::{AutoApprovalConfig, RateLimiter, decide};
use caredesk_record::ActionRecord;
use caredesk_vault::{Folder, VaultError, VaultStore};

use crate::error::{EngineError, Result};
use crate::summary::{
    DecisionResponse, ExecutionResponse, FileSummary, FolderSummary, RawRecordView, SubmitResponse,
};

/// Notes stamped on policy-approved records.
const AUTO_APPROVED_NOTES: &str = "auto-approved";

/// What `notify_new_record` did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The record was submitted for approval (and possibly
    /// auto-approved on the spot).
    Submitted { auto_approved: bool },
    /// The record lacks required metadata and stays in its intake
    /// folder for triage.
    AwaitingTriage,
    /// The filename is already past intake; duplicate notifications
    /// land here and are no-ops.
    AlreadyTracked,
    /// Not a record file, or it vanished before we looked (stale
    /// watcher event).
    Ignored,
}

/// Orchestrates the approval lifecycle over one vault.
pub struct ApprovalEngine {
    store: VaultStore,
    config: Option<AutoApprovalConfig>,
    limiter: Mutex<RateLimiter>,
}

impl ApprovalEngine {
    /// An engine with auto-approval disabled: every record waits for a
    /// human decision.
    pub fn new(store: VaultStore) -> Self {
        Self {
            store,
            config: None,
            limiter: Mutex::new(RateLimiter::new(0)),
        }
    }

    /// An engine applying the auto-approval policy under `config`.
    pub fn with_auto_approval(store: VaultStore, config: AutoApprovalConfig) -> Self {
        let limiter = Mutex::new(RateLimiter::new(config.max_per_hour));
        Self {
            store,
            config: Some(config),
            limiter,
        }
    }

    /// The underlying vault store.
    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    // -- Intake --------------------------------------------------------------

    /// Move a record from Inbox or Needs_Action into Pending_Approval,
    /// stamping `created` if absent, then run the auto-approval policy.
    ///
    /// Precondition: the record has `title` and `type`
    /// ([`EngineError::NotReady`] otherwise).
    pub fn submit_for_approval(&self, filename: &str) -> Result<SubmitResponse> {
        let from = [Folder::Inbox, Folder::NeedsAction]
            .into_iter()
            .find(|f| self.store.exists(*f, filename))
            .ok_or_else(|| EngineError::NotFound {
                filename: filename.to_string(),
                folder: Folder::Inbox,
            })?;

        let record = self.store.read(from, filename)?;
        record
            .require_approval_fields()
            .map_err(|source| EngineError::NotReady {
                filename: filename.to_string(),
                source,
            })?;

        self.store
            .transition(filename, from, Folder::PendingApproval, |r| {
                r.with_created(Utc::now())
            })?;
        info!(filename, %from, "record submitted for approval");

        let auto_approved = self.evaluate(filename)?;
        let location = if auto_approved {
            Folder::Approved
        } else {
            Folder::PendingApproval
        };
        Ok(SubmitResponse {
            filename: filename.to_string(),
            auto_approved,
            new_location: self.location(location, filename),
        })
    }

    /// Watcher entry point. Idempotent: duplicate notifications for a
    /// file already submitted (or already decided) are no-ops, and a
    /// stale event for a vanished file is ignored rather than erroring.
    pub fn notify_new_record(&self, path: &Path) -> Result<NotifyOutcome> {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(NotifyOutcome::Ignored);
        };
        if !filename.ends_with(".md") || filename.starts_with('.') {
            return Ok(NotifyOutcome::Ignored);
        }

        match self.store.locate(filename) {
            None => {
                debug!(filename, "notification for unknown file, ignoring");
                Ok(NotifyOutcome::Ignored)
            }
            Some(Folder::PendingApproval | Folder::Approved | Folder::Done) => {
                debug!(filename, "duplicate notification, record already tracked");
                Ok(NotifyOutcome::AlreadyTracked)
            }
            Some(folder @ (Folder::Inbox | Folder::NeedsAction)) => {
                let record = self.store.read(folder, filename)?;
                if record.require_approval_fields().is_err() {
                    debug!(filename, %folder, "record incomplete, leaving for triage");
                    return Ok(NotifyOutcome::AwaitingTriage);
                }
                match self.submit_for_approval(filename) {
                    Ok(resp) => Ok(NotifyOutcome::Submitted {
                        auto_approved: resp.auto_approved,
                    }),
                    // Lost a race against another notification for the
                    // same file: it is tracked now, which is all the
                    // watcher contract asks for.
                    Err(e) if e.is_conflict() || e.is_not_found() => {
                        Ok(NotifyOutcome::AlreadyTracked)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Run the auto-approval policy against a record sitting in
    /// Pending_Approval. Returns whether it was approved.
    fn evaluate(&self, filename: &str) -> Result<bool> {
        let Some(config) = &self.config else {
            return Ok(false);
        };

        let record = self.store.read(Folder::PendingApproval, filename)?;
        let Some(action_type) = &record.action_type else {
            return Ok(false);
        };

        let verdict = decide(action_type, record.urgency, record.risk_category, config);
        if !verdict.approve {
            debug!(filename, reason = %verdict.reason, "auto-approval denied");
            return Ok(false);
        }

        // Positive verdict still has to clear the hourly cap; when it
        // does not, the record falls back to human approval.
        let granted = self
            .limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .try_consume(Instant::now());
        if !granted {
            info!(filename, "auto-approval rate cap reached, deferring to human review");
            return Ok(false);
        }

        info!(filename, reason = %verdict.reason, "auto-approving");
        self.approve(filename, AUTO_APPROVED_NOTES)?;
        Ok(true)
    }

    // -- Decisions -----------------------------------------------------------

    /// Approve a pending record: Pending_Approval → Approved.
    pub fn approve(&self, filename: &str, notes: &str) -> Result<DecisionResponse> {
        let notes = notes.to_string();
        self.store
            .transition(filename, Folder::PendingApproval, Folder::Approved, move |r| {
                r.with_approval(Utc::now(), notes)
            })
            .map_err(|e| self.map_pending_error(e, filename))?;

        Ok(DecisionResponse {
            filename: filename.to_string(),
            approved: true,
            new_location: self.location(Folder::Approved, filename),
            message: "Action approved".to_string(),
        })
    }

    /// Reject a pending record: Pending_Approval → Done, outcome
    /// `rejected`.
    pub fn reject(&self, filename: &str, notes: &str) -> Result<DecisionResponse> {
        let notes = notes.to_string();
        self.store
            .transition(filename, Folder::PendingApproval, Folder::Done, move |r| {
                r.with_rejection(Utc::now(), notes)
            })
            .map_err(|e| self.map_pending_error(e, filename))?;

        Ok(DecisionResponse {
            filename: filename.to_string(),
            approved: false,
            new_location: self.location(Folder::Done, filename),
            message: "Action rejected".to_string(),
        })
    }

    /// Record that the external executor performed an approved action:
    /// Approved → Done, outcome `executed`.
    pub fn mark_executed(&self, filename: &str, notes: &str) -> Result<ExecutionResponse> {
        let notes = notes.to_string();
        self.store
            .transition(filename, Folder::Approved, Folder::Done, move |r| {
                r.with_execution(Utc::now(), notes)
            })
            .map_err(|e| match e {
                VaultError::NotFound { .. } => match self.store.locate(filename) {
                    Some(folder @ Folder::Done) => EngineError::Conflict {
                        filename: filename.to_string(),
                        folder,
                    },
                    _ => EngineError::NotFound {
                        filename: filename.to_string(),
                        folder: Folder::Approved,
                    },
                },
                other => other.into(),
            })?;

        Ok(ExecutionResponse {
            filename: filename.to_string(),
            status: "completed".to_string(),
            new_location: self.location(Folder::Done, filename),
        })
    }

    // -- Reads ---------------------------------------------------------------

    /// List the records in a folder as display summaries. Unparsable
    /// files are skipped with a warning; a listing never aborts.
    pub fn list(&self, folder: Folder) -> Result<FolderSummary> {
        let mut files = Vec::new();
        for filename in self.store.list(folder)? {
            match self.store.read(folder, &filename) {
                Ok(record) => files.push(FileSummary {
                    filename,
                    title: record.display_title().to_string(),
                    action_type: record.action_type,
                }),
                Err(e) => warn!(%folder, filename, error = %e, "skipping unparsable record"),
            }
        }
        Ok(FolderSummary {
            folder,
            count: files.len(),
            files,
        })
    }

    /// Fetch the full parsed record from a folder.
    pub fn get(&self, folder: Folder, filename: &str) -> Result<ActionRecord> {
        self.store.read(folder, filename).map_err(|e| match e {
            VaultError::NotFound { .. } => EngineError::NotFound {
                filename: filename.to_string(),
                folder,
            },
            other => other.into(),
        })
    }

    /// Fetch raw content plus the parsed record, for any folder.
    pub fn raw(&self, folder: Folder, filename: &str) -> Result<RawRecordView> {
        let raw = self.store.read_raw(folder, filename).map_err(|e| match e {
            VaultError::NotFound { .. } => EngineError::NotFound {
                filename: filename.to_string(),
                folder,
            },
            other => other.into(),
        })?;
        let record = caredesk_record::parse(filename, &raw)?;
        Ok(RawRecordView {
            filename: filename.to_string(),
            folder,
            raw,
            record,
        })
    }

    // -- Helpers -------------------------------------------------------------

    /// Map a failed Pending_Approval transition to the API taxonomy: if
    /// the record turns up downstream it was a lost race (409),
    /// otherwise it genuinely is not there (404).
    fn map_pending_error(&self, e: VaultError, filename: &str) -> EngineError {
        match e {
            VaultError::NotFound { .. } => match self.store.locate(filename) {
                Some(folder @ (Folder::Approved | Folder::Done)) => EngineError::Conflict {
                    filename: filename.to_string(),
                    folder,
                },
                _ => EngineError::NotFound {
                    filename: filename.to_string(),
                    folder: Folder::PendingApproval,
                },
            },
            other => other.into(),
        }
    }

    fn location(&self, folder: Folder, filename: &str) -> String {
        self.store.path(folder, filename).display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use caredesk_record::{ActionType, Urgency};
    use tempfile::TempDir;

    fn manual_engine() -> (TempDir, ApprovalEngine) {
        let dir = TempDir::new().expect("tempdir");
        let store = VaultStore::open(dir.path()).expect("open vault");
        (dir, ApprovalEngine::new(store))
    }

    fn auto_engine(config: AutoApprovalConfig) -> (TempDir, ApprovalEngine) {
        let dir = TempDir::new().expect("tempdir");
        let store = VaultStore::open(dir.path()).expect("open vault");
        (dir, ApprovalEngine::with_auto_approval(store, config))
    }

    fn seed(engine: &ApprovalEngine, folder: Folder, record: &ActionRecord) {
        engine.store().create(folder, record).expect("seed record");
    }

    #[test]
    fn submit_requires_type_and_title() {
        let (_dir, engine) = manual_engine();
        let mut record = ActionRecord::new("No Type", ActionType::Email);
        record.action_type = None;
        seed(&engine, Folder::Inbox, &record);

        let err = engine.submit_for_approval("no_type.md").unwrap_err();
        assert!(matches!(err, EngineError::NotReady { .. }));
        // Still in Inbox.
        assert!(engine.store().exists(Folder::Inbox, "no_type.md"));
    }

    #[test]
    fn submit_stamps_created_and_moves() {
        let (_dir, engine) = manual_engine();
        seed(
            &engine,
            Folder::Inbox,
            &ActionRecord::new("Fresh", ActionType::Email),
        );

        let resp = engine.submit_for_approval("fresh.md").unwrap();
        assert!(!resp.auto_approved);
        assert!(resp.new_location.contains("Pending_Approval"));

        let record = engine.get(Folder::PendingApproval, "fresh.md").unwrap();
        assert!(record.created.is_some());
    }

    #[test]
    fn manual_engine_never_auto_approves() {
        let (_dir, engine) = manual_engine();
        seed(
            &engine,
            Folder::Inbox,
            &ActionRecord::new("Confirm", ActionType::AppointmentConfirmation),
        );

        let resp = engine.submit_for_approval("confirm.md").unwrap();
        assert!(!resp.auto_approved);
        assert!(engine.store().exists(Folder::PendingApproval, "confirm.md"));
    }

    #[test]
    fn auto_approval_moves_safe_category_to_approved() {
        let (_dir, engine) = auto_engine(AutoApprovalConfig::default());
        seed(
            &engine,
            Folder::Inbox,
            &ActionRecord::new("Confirm Visit", ActionType::AppointmentConfirmation),
        );

        let resp = engine.submit_for_approval("confirm_visit.md").unwrap();
        assert!(resp.auto_approved);
        assert!(resp.new_location.contains("Approved"));

        let record = engine.get(Folder::Approved, "confirm_visit.md").unwrap();
        assert_eq!(record.approval_notes.as_deref(), Some("auto-approved"));
        assert!(record.approved_at.is_some());
    }

    #[test]
    fn urgent_record_waits_for_human_even_in_safe_category() {
        let (_dir, engine) = auto_engine(AutoApprovalConfig::default());
        seed(
            &engine,
            Folder::Inbox,
            &ActionRecord::new("Urgent Confirm", ActionType::AppointmentConfirmation)
                .with_urgency(Urgency::Urgent),
        );

        let resp = engine.submit_for_approval("urgent_confirm.md").unwrap();
        assert!(!resp.auto_approved);
        assert!(engine.store().exists(Folder::PendingApproval, "urgent_confirm.md"));
    }

    #[test]
    fn rate_cap_defers_to_human_instead_of_rejecting() {
        let mut config = AutoApprovalConfig::default();
        config.max_per_hour = 1;
        let (_dir, engine) = auto_engine(config);

        for title in ["First Confirm", "Second Confirm"] {
            seed(
                &engine,
                Folder::Inbox,
                &ActionRecord::new(title, ActionType::AppointmentConfirmation),
            );
        }

        let first = engine.submit_for_approval("first_confirm.md").unwrap();
        assert!(first.auto_approved);

        let second = engine.submit_for_approval("second_confirm.md").unwrap();
        assert!(!second.auto_approved);
        // Deferred, not rejected: still pending, nothing in Done.
        assert!(engine.store().exists(Folder::PendingApproval, "second_confirm.md"));
        assert!(engine.list(Folder::Done).unwrap().files.is_empty());
    }

    #[test]
    fn approve_then_reject_is_a_conflict() {
        let (_dir, engine) = manual_engine();
        seed(
            &engine,
            Folder::PendingApproval,
            &ActionRecord::new("Contested", ActionType::Email),
        );

        engine.approve("contested.md", "first decision").unwrap();
        let err = engine.reject("contested.md", "second decision").unwrap_err();
        assert!(err.is_conflict(), "got {err}");
    }

    #[test]
    fn multiline_approval_notes_leave_record_readable() {
        let (_dir, engine) = manual_engine();
        seed(
            &engine,
            Folder::PendingApproval,
            &ActionRecord::new("Multiline", ActionType::PrescriptionSend),
        );

        engine
            .approve("multiline.md", "ok for now\nplease double check dosage")
            .unwrap();

        let record = engine.get(Folder::Approved, "multiline.md").unwrap();
        assert_eq!(
            record.approval_notes.as_deref(),
            Some("ok for now\nplease double check dosage")
        );
        engine.mark_executed("multiline.md", "sent").unwrap();
    }

    #[test]
    fn mark_executed_twice_is_a_conflict() {
        let (_dir, engine) = manual_engine();
        seed(
            &engine,
            Folder::PendingApproval,
            &ActionRecord::new("Run Once", ActionType::Email),
        );
        engine.approve("run_once.md", "ok").unwrap();
        engine.mark_executed("run_once.md", "sent").unwrap();

        let err = engine.mark_executed("run_once.md", "again").unwrap_err();
        assert!(err.is_conflict(), "got {err}");
    }

    #[test]
    fn notify_duplicate_is_idempotent() {
        let (_dir, engine) = manual_engine();
        let record = ActionRecord::new("Watched", ActionType::Email);
        seed(&engine, Folder::Inbox, &record);
        let path = engine.store().path(Folder::Inbox, "watched.md");

        let first = engine.notify_new_record(&path).unwrap();
        assert_eq!(first, NotifyOutcome::Submitted { auto_approved: false });

        let second = engine.notify_new_record(&path).unwrap();
        assert_eq!(second, NotifyOutcome::AlreadyTracked);

        // Exactly one workflow entry.
        assert_eq!(engine.list(Folder::PendingApproval).unwrap().count, 1);
    }

    #[test]
    fn notify_incomplete_record_leaves_it_for_triage() {
        let (_dir, engine) = manual_engine();
        let mut record = ActionRecord::new("Untriaged", ActionType::Email);
        record.title = None;
        seed(&engine, Folder::Inbox, &record);
        let path = engine.store().path(Folder::Inbox, "untriaged.md");

        let outcome = engine.notify_new_record(&path).unwrap();
        assert_eq!(outcome, NotifyOutcome::AwaitingTriage);
        assert!(engine.store().exists(Folder::Inbox, "untriaged.md"));
    }

    #[test]
    fn notify_non_record_paths_are_ignored() {
        let (_dir, engine) = manual_engine();
        let inbox = engine.store().dir(Folder::Inbox);
        assert_eq!(
            engine.notify_new_record(&inbox.join(".swap.md.tmp")).unwrap(),
            NotifyOutcome::Ignored
        );
        assert_eq!(
            engine.notify_new_record(&inbox.join("vanished.md")).unwrap(),
            NotifyOutcome::Ignored
        );
    }
}
