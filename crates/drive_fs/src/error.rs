//! Drive errors
//!
//! Every fallible drive operation returns [`DriveError`]. Operations fail closed:
//! when an error is returned the store is left exactly as it was.

use crate::entry::EntryId;

pub type Result<T> = std::result::Result<T, DriveError>;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Name must not be blank")]
    BlankName,

    #[error("Invalid name '{0}': path separators are not allowed")]
    InvalidName(String),

    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("Entry is not a folder: {0}")]
    NotAFolder(EntryId),

    #[error("Cannot move {id} into itself or one of its descendants ({destination})")]
    InvalidMoveTarget { id: EntryId, destination: EntryId },

    #[error("Nothing to export")]
    EmptyExport,

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl DriveError {
    /// Validation failures are refused requests; everything else is an
    /// integrity or I/O problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DriveError::BlankName
                | DriveError::InvalidName(_)
                | DriveError::NotAFolder(_)
                | DriveError::InvalidMoveTarget { .. }
        )
    }
}
