//! Integration tests for the caredesk-vault crate.
//!
//! These exercise full record lifecycles through the folder store and
//! check the single-location invariant after every transition.

use caredesk_record::{ActionRecord, ActionType};
use caredesk_vault::{Folder, VaultStore};
use chrono::Utc;
use tempfile::TempDir;

fn test_store() -> (TempDir, VaultStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = VaultStore::open(dir.path()).expect("open vault");
    (dir, store)
}

/// Count how many of the five folders currently hold `filename`.
fn holders(store: &VaultStore, filename: &str) -> usize {
    Folder::ALL
        .into_iter()
        .filter(|f| store.exists(*f, filename))
        .count()
}

// ═══════════════════════════════════════════════════════════════════════
//  Lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn full_lifecycle_inbox_to_done() {
    let (_dir, store) = test_store();
    let record = ActionRecord::new("Lab Results - T. Chen", ActionType::LabResultsSend)
        .with_body("Your lab results are attached.")
        .with_created(Utc::now());
    let name = record.filename.clone();

    store.create(Folder::Inbox, &record).unwrap();
    assert_eq!(holders(&store, &name), 1);

    store
        .transition(&name, Folder::Inbox, Folder::PendingApproval, |r| r)
        .unwrap();
    assert_eq!(holders(&store, &name), 1);
    assert_eq!(store.locate(&name), Some(Folder::PendingApproval));

    store
        .transition(&name, Folder::PendingApproval, Folder::Approved, |r| {
            r.with_approval(Utc::now(), "looks right")
        })
        .unwrap();
    assert_eq!(holders(&store, &name), 1);

    let done = store
        .transition(&name, Folder::Approved, Folder::Done, |r| {
            r.with_execution(Utc::now(), "sent via email adapter")
        })
        .unwrap();
    assert_eq!(holders(&store, &name), 1);
    assert_eq!(store.locate(&name), Some(Folder::Done));

    // Metadata accumulated across the whole lifecycle.
    assert!(done.approved_at.is_some());
    assert!(done.executed_at.is_some());
    assert_eq!(done.approval_notes.as_deref(), Some("looks right"));
    assert_eq!(
        done.outcome,
        Some(caredesk_record::Outcome::Executed)
    );
}

#[test]
fn metadata_survives_on_disk_between_transitions() {
    let (_dir, store) = test_store();
    let record = ActionRecord::new("Persist Me", ActionType::Email).with_created(Utc::now());
    store.create(Folder::PendingApproval, &record).unwrap();

    store
        .transition("persist_me.md", Folder::PendingApproval, Folder::Approved, |r| {
            r.with_approval(Utc::now(), "yes")
        })
        .unwrap();

    // Re-open the vault from the same root: state is purely the files.
    let reopened = VaultStore::open(store.root()).unwrap();
    let back = reopened.read(Folder::Approved, "persist_me.md").unwrap();
    assert_eq!(back.approval_notes.as_deref(), Some("yes"));
    assert_eq!(back.created, record.created);
}

// ═══════════════════════════════════════════════════════════════════════
//  Races and conflicts
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn second_transition_on_same_record_loses() {
    let (_dir, store) = test_store();
    let record = ActionRecord::new("Contested", ActionType::Email);
    store.create(Folder::PendingApproval, &record).unwrap();

    // First caller wins.
    store
        .transition("contested.md", Folder::PendingApproval, Folder::Approved, |r| {
            r.with_approval(Utc::now(), "first")
        })
        .unwrap();

    // Second caller finds the source gone.
    let err = store
        .transition("contested.md", Folder::PendingApproval, Folder::Done, |r| {
            r.with_rejection(Utc::now(), "second")
        })
        .unwrap_err();
    assert!(matches!(err, caredesk_vault::VaultError::NotFound { .. }));

    // Exactly one winner's metadata is on disk.
    let winner = store.read(Folder::Approved, "contested.md").unwrap();
    assert_eq!(winner.approval_notes.as_deref(), Some("first"));
    assert_eq!(holders(&store, "contested.md"), 1);
}

#[test]
fn list_is_per_folder_and_sorted() {
    let (_dir, store) = test_store();
    for title in ["Charlie", "alpha", "Bravo"] {
        store
            .create(Folder::NeedsAction, &ActionRecord::new(title, ActionType::Generic))
            .unwrap();
    }
    assert_eq!(
        store.list(Folder::NeedsAction).unwrap(),
        vec!["alpha.md", "bravo.md", "charlie.md"]
    );
    assert!(store.list(Folder::Done).unwrap().is_empty());
}
