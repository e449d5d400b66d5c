//! Upload Ingestion
//!
//! Turns a batch of uploaded items into tree entries. Items may carry a
//! `/`-separated relative path captured from a dropped directory; the folders
//! along that path are synthesized once per batch and shared by every item
//! that passes through them.
//!
//! Ingestion runs in two phases: every handle is read first, then all new
//! entries are committed to the store together. Unreadable items are skipped
//! and counted; they never abort the batch.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::entry::{Blob, Entry, EntryId, FileData};
use crate::error::Result;
use crate::path_resolver::guess_mime;
use crate::store::TreeStore;

// ============================================================================
// UPLOAD INPUT
// ============================================================================

/// A readable binary handle supplied by the upload source.
pub trait BlobHandle {
    fn read(&self) -> io::Result<Vec<u8>>;
}

impl BlobHandle for Vec<u8> {
    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.clone())
    }
}

/// A file on the local disk, read lazily at ingestion time.
#[derive(Clone, Debug)]
pub struct LocalFile(pub PathBuf);

impl BlobHandle for LocalFile {
    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.0)
    }
}

pub struct UploadItem {
    pub name: String,
    /// Path relative to the drop target, including the file name
    /// (e.g. "photos/2024/a.png"). `None` for flat uploads.
    pub relative_path: Option<String>,
    pub mime_type: Option<String>,
    handle: Box<dyn BlobHandle>,
}

impl UploadItem {
    pub fn new(name: impl Into<String>, handle: impl BlobHandle + 'static) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            mime_type: None,
            handle: Box::new(handle),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, bytes.into())
    }

    /// Item backed by a local file; the name is the file name of `path`.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(name, LocalFile(path.to_path_buf()))
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Folder segments and file name for this item.
    fn split(&self) -> (Vec<String>, Option<String>) {
        match self.relative_path.as_deref().map(split_path) {
            Some(mut segments) if !segments.is_empty() => {
                let name = segments.pop();
                (segments, name)
            }
            _ => (Vec::new(), split_path(&self.name).pop()),
        }
    }
}

impl fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadItem")
            .field("name", &self.name)
            .field("relative_path", &self.relative_path)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Split a relative path into usable segments. Empty, `.` and `..` segments
/// are dropped so a path can never climb above the drop target.
fn split_path(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|s| !s.trim().is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
        .collect()
}

// ============================================================================
// INGESTION
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files: Vec<EntryId>,
    pub folders: Vec<EntryId>,
    pub skipped: usize,
}

impl IngestReport {
    pub fn created(&self) -> usize {
        self.files.len() + self.folders.len()
    }
}

struct StagedFile {
    dirs: Vec<String>,
    name: String,
    mime_type: String,
    content: Blob,
}

#[derive(Clone, Debug, Default)]
pub struct UploadIngester {
    pub max_upload_bytes: Option<u64>,
}

impl UploadIngester {
    pub fn new(max_upload_bytes: Option<u64>) -> Self {
        Self { max_upload_bytes }
    }

    /// Ingest one batch under `target` (`None` for the root).
    ///
    /// A missing or non-folder target refuses the whole batch. Folder synthesis
    /// is deduplicated within this batch only; a later batch with the same
    /// paths creates new folders.
    pub fn ingest(
        &self,
        store: &mut TreeStore,
        target: Option<EntryId>,
        items: Vec<UploadItem>,
    ) -> Result<IngestReport> {
        store.require_folder(target)?;

        let mut report = IngestReport::default();
        let staged = self.read_all(items, &mut report);

        let has_folders = staged.iter().any(|s| !s.dirs.is_empty());
        let new_entries = if has_folders {
            Self::build_nested(staged, target, &mut report)
        } else {
            Self::build_flat(staged, target, &mut report)
        };

        store.extend(new_entries);

        tracing::info!(
            "[DRIVE] Ingested {} file(s), synthesized {} folder(s), skipped {}",
            report.files.len(),
            report.folders.len(),
            report.skipped
        );
        Ok(report)
    }

    fn read_all(&self, items: Vec<UploadItem>, report: &mut IngestReport) -> Vec<StagedFile> {
        let mut staged = Vec::with_capacity(items.len());

        for item in items {
            let (dirs, name) = item.split();
            let Some(name) = name else {
                tracing::warn!("[DRIVE] Skipping upload item without a usable name: {:?}", item);
                report.skipped += 1;
                continue;
            };

            let bytes = match item.handle.read() {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("[DRIVE] Skipping unreadable upload item '{}': {}", name, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if let Some(limit) = self.max_upload_bytes {
                if bytes.len() as u64 > limit {
                    tracing::warn!(
                        "[DRIVE] Skipping '{}': {} bytes exceeds upload limit of {}",
                        name,
                        bytes.len(),
                        limit
                    );
                    report.skipped += 1;
                    continue;
                }
            }

            let mime_type = item
                .mime_type
                .unwrap_or_else(|| guess_mime(&name).to_string());

            staged.push(StagedFile {
                dirs,
                name,
                mime_type,
                content: Blob::new(bytes),
            });
        }

        staged
    }

    fn build_flat(staged: Vec<StagedFile>, target: Option<EntryId>, report: &mut IngestReport) -> Vec<Entry> {
        staged
            .into_iter()
            .map(|file| {
                let entry = Entry::file(file.name, target, FileData::new(file.content, file.mime_type));
                report.files.push(entry.id);
                entry
            })
            .collect()
    }

    fn build_nested(staged: Vec<StagedFile>, target: Option<EntryId>, report: &mut IngestReport) -> Vec<Entry> {
        let mut entries = Vec::new();
        // "a/b" -> id of the folder synthesized for that prefix in this batch
        let mut folders: HashMap<String, EntryId> = HashMap::new();

        for file in staged {
            let mut cursor = target;
            let mut prefix = String::new();

            for segment in &file.dirs {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);

                let id = *folders.entry(prefix.clone()).or_insert_with(|| {
                    let folder = Entry::folder(segment.clone(), cursor);
                    let id = folder.id;
                    entries.push(folder);
                    report.folders.push(id);
                    id
                });
                cursor = Some(id);
            }

            let entry = Entry::file(file.name, cursor, FileData::new(file.content, file.mime_type));
            report.files.push(entry.id);
            entries.push(entry);
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriveError;
    use tempfile::TempDir;

    struct Unreadable;

    impl BlobHandle for Unreadable {
        fn read(&self) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn names_in(store: &TreeStore, parent: Option<EntryId>) -> Vec<String> {
        let mut names: Vec<String> = store.entries_in(parent).iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("a/b/c.txt"), vec!["a", "b", "c.txt"]);
        assert_eq!(split_path("/a//./b\\c.txt"), vec!["a", "b", "c.txt"]);
        assert_eq!(split_path("../../etc/passwd"), vec!["etc", "passwd"]);
        assert!(split_path("  /  ").is_empty());
    }

    #[test]
    fn test_flat_upload() {
        let mut store = TreeStore::new();
        let items = vec![
            UploadItem::from_bytes("a.txt", b"aaa".to_vec()),
            UploadItem::from_bytes("b.png", vec![0u8; 10]),
        ];

        let report = UploadIngester::default().ingest(&mut store, None, items).unwrap();

        assert_eq!(report.files.len(), 2);
        assert!(report.folders.is_empty());
        assert_eq!(names_in(&store, None), vec!["a.txt", "b.png"]);

        let png = store.search("b.png")[0];
        let data = png.file_data().unwrap();
        assert_eq!(data.size_bytes, 10);
        assert_eq!(data.mime_type, "image/png");
    }

    #[test]
    fn test_nested_upload_shares_folders() {
        let mut store = TreeStore::new();
        let items = vec![
            UploadItem::from_bytes("f1.txt", b"1".to_vec()).with_relative_path("a/b/f1.txt"),
            UploadItem::from_bytes("f2.txt", b"2".to_vec()).with_relative_path("a/b/f2.txt"),
            UploadItem::from_bytes("f3.txt", b"3".to_vec()).with_relative_path("a/c/f3.txt"),
        ];

        let report = UploadIngester::default().ingest(&mut store, None, items).unwrap();

        assert_eq!(report.created(), 6);
        assert_eq!(report.folders.len(), 3);
        assert_eq!(names_in(&store, None), vec!["a"]);

        let a = store.entries_in(None)[0].id;
        assert_eq!(names_in(&store, Some(a)), vec!["b", "c"]);

        let child = |name: &str| store.entries_in(Some(a)).into_iter().find(|e| e.name == name).unwrap().id;
        assert_eq!(names_in(&store, Some(child("b"))), vec!["f1.txt", "f2.txt"]);
        assert_eq!(names_in(&store, Some(child("c"))), vec!["f3.txt"]);
    }

    #[test]
    fn test_single_segment_paths_match_flat_upload() {
        let mut flat = TreeStore::new();
        let mut nested = TreeStore::new();
        let ingester = UploadIngester::default();

        ingester
            .ingest(&mut flat, None, vec![UploadItem::from_bytes("x.txt", b"x".to_vec())])
            .unwrap();
        ingester
            .ingest(
                &mut nested,
                None,
                vec![
                    UploadItem::from_bytes("x.txt", b"x".to_vec()).with_relative_path("x.txt"),
                    UploadItem::from_bytes("y.txt", b"y".to_vec()).with_relative_path("d/y.txt"),
                ],
            )
            .unwrap();

        let flat_root = flat.entries_in(None);
        let x = nested.entries_in(None).into_iter().find(|e| e.name == "x.txt").unwrap();
        assert_eq!(flat_root.len(), 1);
        assert_eq!(flat_root[0].name, x.name);
        assert_eq!(flat_root[0].parent_id, x.parent_id);
        assert_eq!(flat_root[0].data, x.data);
    }

    #[test]
    fn test_separate_batches_duplicate_folders() {
        let mut store = TreeStore::new();
        let ingester = UploadIngester::default();
        for _ in 0..2 {
            ingester
                .ingest(&mut store, None, vec![UploadItem::from_bytes("f", b"f".to_vec()).with_relative_path("a/f")])
                .unwrap();
        }
        assert_eq!(names_in(&store, None), vec!["a", "a"]);
    }

    #[test]
    fn test_unreadable_items_are_skipped() {
        let mut store = TreeStore::new();
        let items = vec![
            UploadItem::new("broken.txt", Unreadable).with_relative_path("dir/broken.txt"),
            UploadItem::from_bytes("ok.txt", b"ok".to_vec()),
            UploadItem::from_bytes("", b"nameless".to_vec()),
        ];

        let report = UploadIngester::default().ingest(&mut store, None, items).unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.files.len(), 1);
        // The unreadable item never got its folder synthesized.
        assert_eq!(names_in(&store, None), vec!["ok.txt"]);
    }

    #[test]
    fn test_upload_limit() {
        let mut store = TreeStore::new();
        let items = vec![
            UploadItem::from_bytes("small", vec![0u8; 4]),
            UploadItem::from_bytes("big", vec![0u8; 64]),
        ];

        let report = UploadIngester::new(Some(16)).ingest(&mut store, None, items).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(names_in(&store, None), vec!["small"]);
    }

    #[test]
    fn test_invalid_target_refuses_batch() {
        let mut store = TreeStore::new();
        let ingester = UploadIngester::default();
        let report = ingester
            .ingest(&mut store, None, vec![UploadItem::from_bytes("f.txt", b"f".to_vec())])
            .unwrap();
        let file = report.files[0];

        let result = ingester.ingest(&mut store, Some(file), vec![UploadItem::from_bytes("g", b"g".to_vec())]);
        assert!(matches!(result, Err(DriveError::NotAFolder(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_local_file_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# hi").unwrap();

        let mut store = TreeStore::new();
        let items = vec![
            UploadItem::from_path(&path),
            UploadItem::from_path(&dir.path().join("missing.txt")),
        ];
        let report = UploadIngester::default().ingest(&mut store, None, items).unwrap();

        assert_eq!(report.skipped, 1);
        let entry = store.get(report.files[0]).unwrap();
        assert_eq!(entry.name, "notes.md");
        assert_eq!(entry.file_data().unwrap().content.as_bytes(), b"# hi");
        assert_eq!(entry.file_data().unwrap().mime_type, "text/markdown");
    }
}
