//! Review move requests and outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bucket::Bucket;
use crate::folder::Verdict;

/// What a reviewer wants done with an image.
///
/// On the wire this is the compact action code used by the review page:
/// `approve`, `reject` or `catN` (one-based bucket number). The legacy
/// codes `nouhin` and `fuka` are accepted for approve and reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReviewAction {
    /// Move into the source folder's approved subfolder
    Approve,
    /// Move into the source folder's rejected subfolder
    Reject,
    /// Move into another bucket folder under the root (one-based number)
    Reclassify(u32),
}

impl ReviewAction {
    /// Verdict for approve/reject actions.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            ReviewAction::Approve => Some(Verdict::Approved),
            ReviewAction::Reject => Some(Verdict::Rejected),
            ReviewAction::Reclassify(_) => None,
        }
    }

    /// Target bucket for reclassify actions. `None` when out of range.
    pub fn target_bucket(&self) -> Option<Bucket> {
        match self {
            ReviewAction::Reclassify(number) => Bucket::from_number(*number),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(&self) -> String {
        match self {
            ReviewAction::Approve => "approve".to_string(),
            ReviewAction::Reject => "reject".to_string(),
            ReviewAction::Reclassify(n) => format!("cat{n}"),
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Unrecognised action code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown review action '{0}'")]
pub struct ActionParseError(pub String);

impl FromStr for ReviewAction {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        match code {
            "approve" | "nouhin" => Ok(ReviewAction::Approve),
            "reject" | "fuka" => Ok(ReviewAction::Reject),
            _ => code
                .strip_prefix("cat")
                .and_then(|n| n.parse::<u32>().ok())
                .map(ReviewAction::Reclassify)
                .ok_or_else(|| ActionParseError(code.to_string())),
        }
    }
}

impl TryFrom<String> for ReviewAction {
    type Error = ActionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReviewAction> for String {
    fn from(action: ReviewAction) -> Self {
        action.code()
    }
}

/// Request to move an image between folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub file_id: String,
    /// Folder the reviewer believes currently holds the file
    pub source_folder_id: String,
    pub action: ReviewAction,
}

/// Result of a move that reached the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// File now lives only in `new_parent`
    Moved { file_id: String, new_parent: String },
    /// The file was no longer in the claimed source folder; nothing changed
    Conflict {
        file_id: String,
        current_parents: Vec<String>,
    },
}

impl MoveOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, MoveOutcome::Conflict { .. })
    }
}
