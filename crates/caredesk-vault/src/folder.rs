//! The five lifecycle folders.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VaultError;

/// A lifecycle folder. The variant IS the workflow state: which folder a
/// record file sits in determines where it is in the approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// Raw intake from producers (email watcher, forms, scheduled jobs).
    Inbox,
    /// Holding state for records needing triage before they become
    /// approval candidates. Producer-filled; listable only from the
    /// workflow's point of view.
    NeedsAction,
    /// Awaiting a human (or auto-approval) decision.
    PendingApproval,
    /// Approved; an external executor picks these up.
    Approved,
    /// Terminal: executed or rejected.
    Done,
}

impl Folder {
    /// All five folders, in lifecycle order.
    pub const ALL: [Folder; 5] = [
        Folder::Inbox,
        Folder::NeedsAction,
        Folder::PendingApproval,
        Folder::Approved,
        Folder::Done,
    ];

    /// The on-disk directory name.
    pub fn as_dir(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::NeedsAction => "Needs_Action",
            Self::PendingApproval => "Pending_Approval",
            Self::Approved => "Approved",
            Self::Done => "Done",
        }
    }

    /// Parse a folder from its directory name.
    pub fn parse(s: &str) -> std::result::Result<Self, VaultError> {
        match s {
            "Inbox" => Ok(Self::Inbox),
            "Needs_Action" => Ok(Self::NeedsAction),
            "Pending_Approval" => Ok(Self::PendingApproval),
            "Approved" => Ok(Self::Approved),
            "Done" => Ok(Self::Done),
            other => Err(VaultError::UnknownFolder(other.to_string())),
        }
    }

    /// Whether producers may create new records here. Approved and Done
    /// are written exclusively by the workflow engine.
    pub fn accepts_new_records(&self) -> bool {
        matches!(self, Self::Inbox | Self::NeedsAction | Self::PendingApproval)
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_dir())
    }
}

impl Serialize for Folder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_dir())
    }
}

impl<'de> Deserialize<'de> for Folder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
