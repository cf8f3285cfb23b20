//! Integration tests for the caredesk-engine crate.
//!
//! Exercises the full approval surface the way an HTTP layer or CLI
//! would drive it: folder summaries, decisions, execution, and the
//! watcher entry point.

use std::sync::Arc;

use caredesk_engine::{ApprovalEngine, EngineError, NotifyOutcome};
use caredesk_policy::AutoApprovalConfig;
use caredesk_record::{ActionRecord, ActionType, Urgency};
use caredesk_vault::{Folder, VaultStore};
use tempfile::TempDir;

fn manual_engine() -> (TempDir, ApprovalEngine) {
    let dir = TempDir::new().expect("tempdir");
    let store = VaultStore::open(dir.path()).expect("open vault");
    (dir, ApprovalEngine::new(store))
}

fn pending(engine: &ApprovalEngine, record: &ActionRecord) {
    engine
        .store()
        .create(Folder::PendingApproval, record)
        .expect("seed pending record");
}

// ═══════════════════════════════════════════════════════════════════════
//  Listing and fetching
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn pending_record_shows_up_in_the_summary() {
    let (_dir, engine) = manual_engine();
    pending(
        &engine,
        &ActionRecord::new("Test Approval", ActionType::Email),
    );

    let summary = engine.list(Folder::PendingApproval).unwrap();
    assert_eq!(summary.folder, Folder::PendingApproval);
    assert_eq!(summary.count, 1);
    assert_eq!(summary.files[0].filename, "test_approval.md");
    assert_eq!(summary.files[0].title, "Test Approval");
    assert_eq!(summary.files[0].action_type, Some(ActionType::Email));
}

#[test]
fn summaries_serialize_to_the_api_shape() {
    let (_dir, engine) = manual_engine();
    pending(
        &engine,
        &ActionRecord::new("Test Approval", ActionType::Email),
    );

    let summary = engine.list(Folder::PendingApproval).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["folder"], "Pending_Approval");
    assert_eq!(json["count"], 1);
    assert_eq!(json["files"][0]["filename"], "test_approval.md");
    assert_eq!(json["files"][0]["type"], "email");
}

#[test]
fn raw_view_carries_content_and_parsed_record() {
    let (_dir, engine) = manual_engine();
    pending(
        &engine,
        &ActionRecord::new("Raw View", ActionType::Whatsapp).with_body("hello patient"),
    );

    let view = engine.raw(Folder::PendingApproval, "raw_view.md").unwrap();
    assert!(view.raw.starts_with("---\n"));
    assert!(view.raw.contains("type: whatsapp"));
    assert_eq!(view.record.body, "hello patient");
}

#[test]
fn get_from_wrong_folder_is_not_found() {
    let (_dir, engine) = manual_engine();
    pending(&engine, &ActionRecord::new("Here", ActionType::Email));

    let err = engine.get(Folder::Approved, "here.md").unwrap_err();
    assert!(err.is_not_found());
}

// ═══════════════════════════════════════════════════════════════════════
//  Decisions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn approve_moves_record_under_approved() {
    let (_dir, engine) = manual_engine();
    pending(
        &engine,
        &ActionRecord::new("Approval Test", ActionType::Email),
    );

    let resp = engine
        .approve("approval_test.md", "Approved for execution")
        .unwrap();
    assert!(resp.approved);
    assert!(resp.new_location.contains("Approved"));
    assert_eq!(resp.message, "Action approved");

    assert!(engine.store().exists(Folder::Approved, "approval_test.md"));
    assert!(!engine.store().exists(Folder::PendingApproval, "approval_test.md"));

    let record = engine.get(Folder::Approved, "approval_test.md").unwrap();
    assert_eq!(record.approval_notes.as_deref(), Some("Approved for execution"));
}

#[test]
fn reject_moves_record_under_done() {
    let (_dir, engine) = manual_engine();
    pending(
        &engine,
        &ActionRecord::new("Rejection Test", ActionType::Email),
    );

    let resp = engine
        .reject("rejection_test.md", "Rejected due to inappropriate content")
        .unwrap();
    assert!(!resp.approved);
    assert!(resp.new_location.contains("Done"));
    assert_eq!(resp.message, "Action rejected");

    assert!(engine.store().exists(Folder::Done, "rejection_test.md"));
    let record = engine.get(Folder::Done, "rejection_test.md").unwrap();
    assert_eq!(record.outcome, Some(caredesk_record::Outcome::Rejected));
    assert_eq!(
        record.rejection_notes.as_deref(),
        Some("Rejected due to inappropriate content")
    );
}

#[test]
fn deciding_a_nonexistent_record_is_not_found() {
    let (_dir, engine) = manual_engine();
    let err = engine.approve("nonexistent.md", "whatever").unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound {
            folder: Folder::PendingApproval,
            ..
        }
    ));
}

#[test]
fn mark_executed_completes_an_approved_action() {
    let (_dir, engine) = manual_engine();
    pending(&engine, &ActionRecord::new("To Execute", ActionType::Email));
    engine.approve("to_execute.md", "go ahead").unwrap();

    let resp = engine
        .mark_executed("to_execute.md", "Successfully executed")
        .unwrap();
    assert_eq!(resp.status, "completed");
    assert!(resp.new_location.contains("Done"));

    assert!(engine.store().exists(Folder::Done, "to_execute.md"));
    let record = engine.get(Folder::Done, "to_execute.md").unwrap();
    assert_eq!(record.execution_notes.as_deref(), Some("Successfully executed"));
    assert_eq!(record.outcome, Some(caredesk_record::Outcome::Executed));
}

// ═══════════════════════════════════════════════════════════════════════
//  Single-location invariant
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn a_filename_is_never_in_two_folders() {
    let (_dir, engine) = manual_engine();
    engine
        .store()
        .create(
            Folder::Inbox,
            &ActionRecord::new("Tracked Everywhere", ActionType::Email),
        )
        .unwrap();

    let count = |engine: &ApprovalEngine| {
        Folder::ALL
            .into_iter()
            .filter(|f| engine.store().exists(*f, "tracked_everywhere.md"))
            .count()
    };

    assert_eq!(count(&engine), 1);
    engine.submit_for_approval("tracked_everywhere.md").unwrap();
    assert_eq!(count(&engine), 1);
    engine.approve("tracked_everywhere.md", "ok").unwrap();
    assert_eq!(count(&engine), 1);
    engine.mark_executed("tracked_everywhere.md", "done").unwrap();
    assert_eq!(count(&engine), 1);
    assert!(engine.store().exists(Folder::Done, "tracked_everywhere.md"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Auto-approval end to end
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn auto_approval_policy_summary() {
    let (_dir, engine) = {
        let dir = TempDir::new().expect("tempdir");
        let store = VaultStore::open(dir.path()).expect("open vault");
        (
            dir,
            ApprovalEngine::with_auto_approval(store, AutoApprovalConfig::default()),
        )
    };

    // Safe category sails through.
    engine
        .store()
        .create(
            Folder::Inbox,
            &ActionRecord::new("Visit Confirmed", ActionType::AppointmentConfirmation),
        )
        .unwrap();
    assert!(engine.submit_for_approval("visit_confirmed.md").unwrap().auto_approved);

    // Clinical content does not.
    engine
        .store()
        .create(
            Folder::Inbox,
            &ActionRecord::new("Rx Refill", ActionType::PrescriptionSend),
        )
        .unwrap();
    assert!(!engine.submit_for_approval("rx_refill.md").unwrap().auto_approved);

    // Urgency blocks even the safe category.
    engine
        .store()
        .create(
            Folder::Inbox,
            &ActionRecord::new("Urgent Visit", ActionType::AppointmentConfirmation)
                .with_urgency(Urgency::Urgent),
        )
        .unwrap();
    assert!(!engine.submit_for_approval("urgent_visit.md").unwrap().auto_approved);
}

// ═══════════════════════════════════════════════════════════════════════
//  Watcher contract
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_notifications_create_one_entry() {
    let (_dir, engine) = manual_engine();
    let engine = Arc::new(engine);
    engine
        .store()
        .create(
            Folder::Inbox,
            &ActionRecord::new("Notified Twice", ActionType::Email),
        )
        .unwrap();
    let path = engine.store().path(Folder::Inbox, "notified_twice.md");

    assert_eq!(
        engine.notify_new_record(&path).unwrap(),
        NotifyOutcome::Submitted { auto_approved: false }
    );
    assert_eq!(
        engine.notify_new_record(&path).unwrap(),
        NotifyOutcome::AlreadyTracked
    );
    assert_eq!(engine.list(Folder::PendingApproval).unwrap().count, 1);
}
