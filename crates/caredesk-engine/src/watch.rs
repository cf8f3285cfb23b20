//! Inbox watcher — feeds filesystem events into the engine.
//!
//! Watches the vault's `Inbox/` directory for create/modify events,
//! debounces them per file (producers often write in several chunks),
//! and forwards each settled path to
//! [`ApprovalEngine::notify_new_record`]. Delivery is at-least-once;
//! the engine's idempotency handles the duplicates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::engine::ApprovalEngine;
use crate::error::Result;

/// How long a file must stay quiet before we hand it to the engine.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// A running watcher over one vault's Inbox.
///
/// Dropping the handle stops both the filesystem watcher and the
/// forwarding task.
pub struct InboxWatcher {
    _watcher: RecommendedWatcher,
    task: tokio::task::JoinHandle<()>,
}

impl InboxWatcher {
    /// Start watching `engine`'s Inbox folder. Must be called from
    /// within a tokio runtime.
    pub fn spawn(engine: Arc<ApprovalEngine>) -> Result<Self> {
        let inbox = engine.store().dir(caredesk_vault::Folder::Inbox);
        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => error!(error = %e, "inbox watcher error"),
            }
        })
        .map_err(io_from_notify)?;

        watcher
            .watch(&inbox, RecursiveMode::NonRecursive)
            .map_err(io_from_notify)?;
        info!(inbox = %inbox.display(), "inbox watcher started");

        let task = tokio::spawn(debounce_loop(engine, rx));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Stop the forwarding task.
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Collect raw events until each path has been quiet for [`DEBOUNCE`],
/// then notify the engine.
async fn debounce_loop(engine: Arc<ApprovalEngine>, mut rx: mpsc::UnboundedReceiver<PathBuf>) {
    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        let next_deadline = pending.values().min().copied();

        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(path) => {
                        pending.insert(path, Instant::now() + DEBOUNCE);
                    }
                    // Watcher dropped; flush what is left and exit.
                    None => {
                        for path in pending.into_keys() {
                            forward(&engine, &path);
                        }
                        return;
                    }
                }
            }
            _ = sleep_until(next_deadline), if next_deadline.is_some() => {
                let now = Instant::now();
                let due: Vec<PathBuf> = pending
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(path, _)| path.clone())
                    .collect();
                for path in due {
                    pending.remove(&path);
                    forward(&engine, &path);
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn forward(engine: &ApprovalEngine, path: &std::path::Path) {
    match engine.notify_new_record(path) {
        Ok(outcome) => debug!(path = %path.display(), ?outcome, "inbox notification handled"),
        Err(e) => warn!(path = %path.display(), error = %e, "inbox notification failed"),
    }
}

fn io_from_notify(e: notify::Error) -> crate::error::EngineError {
    caredesk_vault::VaultError::Io(std::io::Error::other(e)).into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use caredesk_record::{ActionType, codec};
    use caredesk_vault::{Folder, VaultStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn watcher_picks_up_a_dropped_record() {
        let dir = TempDir::new().expect("tempdir");
        let store = VaultStore::open(dir.path()).expect("open vault");
        let engine = Arc::new(ApprovalEngine::new(store));
        let watcher = InboxWatcher::spawn(Arc::clone(&engine)).expect("spawn watcher");

        let record = caredesk_record::ActionRecord::new("From Watcher", ActionType::Email)
            .with_body("dropped by a producer");
        std::fs::write(
            engine.store().path(Folder::Inbox, &record.filename),
            codec::serialize(&record),
        )
        .expect("write record");

        // Debounce window plus slack for the event to propagate.
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if engine.store().exists(Folder::PendingApproval, "from_watcher.md") {
                break;
            }
            assert!(Instant::now() < deadline, "watcher never submitted the record");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        watcher.stop();
    }
}
