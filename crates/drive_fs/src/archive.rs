//! Archive Export
//!
//! Bundles a set of entries into a single ZIP archive held in memory. Selected
//! files land at the archive root under their own name; selected folders are
//! mirrored depth first with every folder written as an explicit directory
//! record, so empty folders survive extraction.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::{ArchiveCompression, DriveConfig};
use crate::entry::{Entry, EntryData, EntryId};
use crate::error::{DriveError, Result};
use crate::store::TreeStore;

/// A finished archive. `bytes` is a complete ZIP file.
#[derive(Clone, Debug)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub file_count: usize,
    pub folder_count: usize,
}

impl From<ArchiveCompression> for CompressionMethod {
    fn from(compression: ArchiveCompression) -> Self {
        match compression {
            ArchiveCompression::Stored => CompressionMethod::Stored,
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Export `ids` as one archive.
///
/// Stale ids are ignored, and an id whose ancestor is also part of the export
/// is only written once, inside its ancestor. When nothing exportable remains
/// the call fails with [`DriveError::EmptyExport`] and produces no bytes.
pub fn export_archive(
    store: &TreeStore,
    ids: &[EntryId],
    config: &DriveConfig,
    now: DateTime<Utc>,
) -> Result<Archive> {
    let mut roots: Vec<&Entry> = Vec::new();
    for id in ids {
        match store.get(*id) {
            Some(entry) if !roots.iter().any(|r| r.id == entry.id) => roots.push(entry),
            Some(_) => {}
            None => tracing::warn!("[DRIVE] Skipping stale id {} in export", id),
        }
    }
    let roots: Vec<&Entry> = roots
        .iter()
        .copied()
        .filter(|entry| {
            !roots
                .iter()
                .any(|other| other.id != entry.id && store.is_descendant_or_self(other.id, entry.id))
        })
        .collect();

    if roots.is_empty() {
        return Err(DriveError::EmptyExport);
    }

    let file_name = match roots.as_slice() {
        [only] => format!("{}.zip", only.name),
        _ => format!("{}-{}.zip", config.archive_prefix, now.format("%Y%m%d-%H%M%S")),
    };

    let mut builder = ArchiveBuilder::new(config.compression);
    for root in &roots {
        builder.add(store, root, "")?;
    }
    let archive = builder.finish(file_name)?;

    tracing::info!(
        "[DRIVE] ✅ Exported {} ({} files, {} folders, {} bytes)",
        archive.file_name,
        archive.file_count,
        archive.folder_count,
        archive.bytes.len()
    );
    Ok(archive)
}

struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
    used_paths: HashSet<String>,
    visited: HashSet<EntryId>,
    file_count: usize,
    folder_count: usize,
}

impl ArchiveBuilder {
    fn new(compression: ArchiveCompression) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(compression.into()),
            used_paths: HashSet::new(),
            visited: HashSet::new(),
            file_count: 0,
            folder_count: 0,
        }
    }

    fn add(&mut self, store: &TreeStore, entry: &Entry, prefix: &str) -> Result<()> {
        if !self.visited.insert(entry.id) {
            return Ok(());
        }

        match &entry.data {
            EntryData::File(file) => {
                let path = self.claim_path(prefix, &entry.name, false);
                self.writer.start_file(path, self.options)?;
                self.writer.write_all(file.content.as_bytes())?;
                self.file_count += 1;
            }
            EntryData::Folder => {
                let path = self.claim_path(prefix, &entry.name, true);
                self.writer.add_directory(path.as_str(), self.options)?;
                self.folder_count += 1;

                for child in store.entries_in(Some(entry.id)) {
                    self.add(store, child, &path)?;
                }
            }
        }
        Ok(())
    }

    /// First free archive path for `name` under `prefix`. Taken paths get a
    /// " (n)" suffix, placed before the extension for files.
    fn claim_path(&mut self, prefix: &str, name: &str, is_dir: bool) -> String {
        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            }
        };

        let path = join(name);
        if self.used_paths.insert(path.clone()) {
            return path;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !is_dir && !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };

        let mut n = 1;
        loop {
            let candidate = match ext {
                Some(ext) => join(&format!("{} ({}).{}", stem, n, ext)),
                None => join(&format!("{} ({})", stem, n)),
            };
            if self.used_paths.insert(candidate.clone()) {
                tracing::debug!("[DRIVE] Archive path '{}' taken, using '{}'", path, candidate);
                return candidate;
            }
            n += 1;
        }
    }

    fn finish(mut self, file_name: String) -> Result<Archive> {
        let cursor = self.writer.finish()?;
        Ok(Archive {
            file_name,
            bytes: cursor.into_inner(),
            file_count: self.file_count,
            folder_count: self.folder_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Blob, FileData};
    use chrono::TimeZone;
    use std::io::Read;
    use zip::ZipArchive;

    fn add_file(store: &mut TreeStore, name: &str, parent: Option<EntryId>, body: &[u8]) -> EntryId {
        store.insert(Entry::file(name, parent, FileData::new(Blob::from(body), "text/plain")))
    }

    fn names(archive: &Archive) -> Vec<String> {
        let zip = ZipArchive::new(Cursor::new(archive.bytes.clone())).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_single_file_export() {
        let mut store = TreeStore::new();
        let f = add_file(&mut store, "notes.txt", None, b"hello");

        let archive = export_archive(&store, &[f], &DriveConfig::default(), fixed_now()).unwrap();

        assert_eq!(archive.file_name, "notes.txt.zip");
        assert_eq!(names(&archive), vec!["notes.txt"]);

        let mut zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut body = String::new();
        zip.by_name("notes.txt").unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_folder_export_keeps_structure_and_empty_folders() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let b = store.create_folder(Some(a), "b").unwrap();
        store.create_folder(Some(a), "empty").unwrap();
        add_file(&mut store, "f.txt", Some(b), b"x");

        let config = DriveConfig {
            compression: ArchiveCompression::Stored,
            ..DriveConfig::default()
        };
        let archive = export_archive(&store, &[a], &config, fixed_now()).unwrap();

        assert_eq!(archive.file_name, "a.zip");
        assert_eq!(archive.folder_count, 3);
        assert_eq!(archive.file_count, 1);
        assert_eq!(names(&archive), vec!["a/", "a/b/", "a/b/f.txt", "a/empty/"]);
    }

    #[test]
    fn test_multi_export_name_uses_timestamp() {
        let mut store = TreeStore::new();
        let x = add_file(&mut store, "x", None, b"x");
        let y = add_file(&mut store, "y", None, b"y");

        let archive = export_archive(&store, &[x, y], &DriveConfig::default(), fixed_now()).unwrap();
        assert_eq!(archive.file_name, "drive-export-20240309-140507.zip");
    }

    #[test]
    fn test_colliding_names_get_suffix() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let b = store.create_folder(None, "b").unwrap();
        let one = add_file(&mut store, "report.pdf", Some(a), b"1");
        let two = add_file(&mut store, "report.pdf", Some(b), b"2");
        let three = add_file(&mut store, "report.pdf", None, b"3");

        let archive = export_archive(&store, &[one, two, three], &DriveConfig::default(), fixed_now()).unwrap();
        assert_eq!(
            names(&archive),
            vec!["report (1).pdf", "report (2).pdf", "report.pdf"]
        );
    }

    #[test]
    fn test_nested_selection_is_written_once() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let f = add_file(&mut store, "f.txt", Some(a), b"x");

        let archive = export_archive(&store, &[f, a], &DriveConfig::default(), fixed_now()).unwrap();
        assert_eq!(archive.file_name, "a.zip");
        assert_eq!(names(&archive), vec!["a/", "a/f.txt"]);
    }

    #[test]
    fn test_empty_export_is_refused() {
        let store = TreeStore::new();
        let config = DriveConfig::default();
        assert!(matches!(
            export_archive(&store, &[], &config, fixed_now()),
            Err(DriveError::EmptyExport)
        ));
        assert!(matches!(
            export_archive(&store, &[EntryId::new()], &config, fixed_now()),
            Err(DriveError::EmptyExport)
        ));
    }
}
