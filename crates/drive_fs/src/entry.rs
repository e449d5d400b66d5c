use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// IDS - Opaque, never reused entry identifiers
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Allocate a fresh id. Random v4 ids are never handed out twice.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

// ============================================================================
// BLOB - Shared file payload
// ============================================================================

/// Owned file content. Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob(Arc<[u8]>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.0.len())
    }
}

// ============================================================================
// ENTRY - A file or folder node in the virtual tree
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileData {
    pub size_bytes: u64,
    pub mime_type: String,
    #[serde(skip)]
    pub content: Blob,
}

impl FileData {
    pub fn new(content: Blob, mime_type: impl Into<String>) -> Self {
        Self {
            size_bytes: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// Kind-specific data. Only files carry a payload, and the variant never
/// changes after creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryData {
    Folder,
    File(FileData),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    /// `None` means the entry lives at the root.
    pub parent_id: Option<EntryId>,
    pub modified_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: EntryData,
}

impl Entry {
    pub fn folder(name: impl Into<String>, parent_id: Option<EntryId>) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            parent_id,
            modified_at: Utc::now(),
            data: EntryData::Folder,
        }
    }

    pub fn file(name: impl Into<String>, parent_id: Option<EntryId>, file: FileData) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            parent_id,
            modified_at: Utc::now(),
            data: EntryData::File(file),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.data {
            EntryData::Folder => EntryKind::Folder,
            EntryData::File(_) => EntryKind::File,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.data, EntryData::Folder)
    }

    pub fn is_file(&self) -> bool {
        !self.is_folder()
    }

    pub fn file_data(&self) -> Option<&FileData> {
        match &self.data {
            EntryData::File(file) => Some(file),
            EntryData::Folder => None,
        }
    }

    /// Payload size, zero for folders.
    pub fn size_bytes(&self) -> u64 {
        self.file_data().map(|f| f.size_bytes).unwrap_or(0)
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}
