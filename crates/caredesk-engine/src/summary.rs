//! Serializable views returned by the engine.
//!
//! These are the exact payload shapes an HTTP layer or CLI renders;
//! the engine itself never prints.

use serde::{Deserialize, Serialize};

use caredesk_record::{ActionRecord, ActionType};
use caredesk_vault::Folder;

/// One line of a folder listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub filename: String,
    pub title: String,
    /// Absent when the record has no `type` yet (Inbox/Needs_Action
    /// records awaiting triage).
    #[serde(rename = "type")]
    pub action_type: Option<ActionType>,
}

/// A folder listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub folder: Folder,
    pub count: usize,
    pub files: Vec<FileSummary>,
}

/// Result of an approve/reject decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub filename: String,
    pub approved: bool,
    /// Full path of the record after the move.
    pub new_location: String,
    pub message: String,
}

/// Result of marking an approved action executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub filename: String,
    /// Always `"completed"`.
    pub status: String,
    pub new_location: String,
}

/// Result of submitting a record for approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub filename: String,
    /// Whether the auto-approval policy passed it straight through.
    pub auto_approved: bool,
    pub new_location: String,
}

/// Raw file content plus the parsed record, for any folder.
#[derive(Debug, Clone, Serialize)]
pub struct RawRecordView {
    pub filename: String,
    pub folder: Folder,
    pub raw: String,
    pub record: ActionRecord,
}
