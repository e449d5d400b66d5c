//! Drive Filesystem Layer
//!
//! In-memory virtual drive: a tree of folders and files with upload ingestion,
//! validated mutations, multi-selection and ZIP export.
//!
//! [`Drive`] is the entry point. It owns the [`TreeStore`] and the
//! [`DriveConfig`]; views keep their own [`ViewState`] and pass it in for
//! operations that depend on the cursor or the selection.

pub mod archive;
pub mod config;
pub mod entry;
pub mod error;
pub mod ingest;
pub mod listing;
pub mod operations;
pub mod path_resolver;
pub mod selection;
pub mod store;

pub use archive::{export_archive, Archive};
pub use config::{ArchiveCompression, DriveConfig};
pub use entry::{Blob, Entry, EntryData, EntryId, EntryKind, FileData};
pub use error::{DriveError, Result};
pub use ingest::{BlobHandle, IngestReport, LocalFile, UploadIngester, UploadItem};
pub use listing::{list_folder, ListOptions, SortBy, SortOrder};
pub use operations::BatchOutcome;
pub use path_resolver::{describe, EntryDisplay, FileType};
pub use selection::{ClickOutcome, SelectionController, SelectionMode, ViewState};
pub use store::{Crumb, TreeStore};

use chrono::Utc;

/// The drive manager. Coordinates store mutations with the caller's view.
#[derive(Debug, Default)]
pub struct Drive {
    store: TreeStore,
    config: DriveConfig,
}

impl Drive {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            store: TreeStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.store.get(id)
    }

    pub fn entries_in(&self, folder: Option<EntryId>) -> Vec<&Entry> {
        self.store.entries_in(folder)
    }

    pub fn descendants_of(&self, id: EntryId) -> Vec<EntryId> {
        self.store.descendants_of(id)
    }

    /// Breadcrumb for `folder` labelled with the configured root name.
    pub fn breadcrumb(&self, folder: Option<EntryId>) -> Vec<Crumb> {
        self.store.breadcrumb_with_root(folder, &self.config.root_label)
    }

    pub fn search(&self, query: &str) -> Vec<&Entry> {
        self.store.search(query)
    }

    /// Human readable location of the folder holding `id`.
    pub fn location_of(&self, id: EntryId) -> Option<String> {
        path_resolver::location_of(&self.store, id, &self.config.root_label)
    }

    /// Listing options seeded from the config.
    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            show_hidden: self.config.show_hidden,
            ..ListOptions::default()
        }
    }

    pub fn list(&self, folder: Option<EntryId>, options: &ListOptions) -> Vec<&Entry> {
        list_folder(&self.store, folder, options)
    }

    /// Folders a set of entries could be moved into: every folder outside
    /// their subtrees.
    pub fn move_targets(&self, ids: &[EntryId]) -> Vec<&Entry> {
        self.store
            .entries()
            .iter()
            .filter(|e| e.is_folder())
            .filter(|e| !ids.iter().any(|id| self.store.is_descendant_or_self(*id, e.id)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn create_folder(&mut self, parent: Option<EntryId>, name: &str) -> Result<EntryId> {
        self.store.create_folder(parent, name)
    }

    pub fn rename(&mut self, id: EntryId, new_name: &str) -> Result<()> {
        self.store.rename(id, new_name)
    }

    pub fn move_entry(&mut self, id: EntryId, destination: Option<EntryId>) -> Result<()> {
        self.store.move_entry(id, destination)
    }

    pub fn move_many(&mut self, ids: &[EntryId], destination: Option<EntryId>) -> BatchOutcome {
        self.store.move_many(ids, destination)
    }

    /// Delete `id` with its subtree. A cursor inside the removed subtree
    /// retreats to the deepest surviving ancestor.
    pub fn delete(&mut self, view: &mut ViewState, id: EntryId) -> Result<Vec<EntryId>> {
        let trail = self.store.breadcrumb_for(view.cursor());
        let removed = self.store.delete(id)?;
        view.reconcile(&self.store, &trail);
        Ok(removed)
    }

    pub fn delete_many(&mut self, view: &mut ViewState, ids: &[EntryId]) -> BatchOutcome {
        let trail = self.store.breadcrumb_for(view.cursor());
        let outcome = self.store.delete_many(ids);
        view.reconcile(&self.store, &trail);
        outcome
    }

    pub fn ingest_upload(&mut self, target: Option<EntryId>, items: Vec<UploadItem>) -> Result<IngestReport> {
        UploadIngester::new(self.config.max_upload_bytes).ingest(&mut self.store, target, items)
    }

    pub fn export_archive(&self, ids: &[EntryId]) -> Result<Archive> {
        archive::export_archive(&self.store, ids, &self.config, Utc::now())
    }

    // ------------------------------------------------------------------------
    // View-scoped commands
    // ------------------------------------------------------------------------

    pub fn navigate(&self, view: &mut ViewState, folder: Option<EntryId>) -> Result<()> {
        view.navigate(&self.store, folder)
    }

    pub fn click(&self, view: &mut ViewState, id: EntryId) -> Result<ClickOutcome> {
        view.click(&self.store, id)
    }

    /// Delete every selected entry and return to Browse mode.
    pub fn delete_selection(&mut self, view: &mut ViewState) -> BatchOutcome {
        let ids = view.selection.selected_ids().to_vec();
        let outcome = self.delete_many(view, &ids);
        view.selection.clear();
        outcome
    }

    /// Move every selected entry into `destination`. The selection is cleared
    /// afterwards, as after a drop.
    pub fn move_selection(&mut self, view: &mut ViewState, destination: Option<EntryId>) -> BatchOutcome {
        let ids = view.selection.selected_ids().to_vec();
        let outcome = self.store.move_many(&ids, destination);
        view.selection.clear();
        outcome
    }

    pub fn export_selection(&self, view: &ViewState) -> Result<Archive> {
        self.export_archive(view.selection.selected_ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadcrumb_uses_configured_label() {
        let mut drive = Drive::new(DriveConfig {
            root_label: "My Drive".to_string(),
            ..DriveConfig::default()
        });
        let a = drive.create_folder(None, "a").unwrap();
        let f = drive
            .ingest_upload(Some(a), vec![UploadItem::from_bytes("f.txt", b"x".to_vec())])
            .unwrap()
            .files[0];

        assert_eq!(drive.breadcrumb(Some(a))[0].name, "My Drive");
        assert_eq!(drive.location_of(f).as_deref(), Some("My Drive / a"));
    }

    #[test]
    fn test_move_targets_exclude_subtree() {
        let mut drive = Drive::default();
        let a = drive.create_folder(None, "a").unwrap();
        let b = drive.create_folder(Some(a), "b").unwrap();
        let other = drive.create_folder(None, "other").unwrap();

        let targets: Vec<EntryId> = drive.move_targets(&[a]).iter().map(|e| e.id).collect();
        assert_eq!(targets, vec![other]);
        assert_eq!(drive.move_targets(&[b]).len(), 2);
    }

    #[test]
    fn test_move_selection_clears_selection() {
        let mut drive = Drive::default();
        let dest = drive.create_folder(None, "dest").unwrap();
        let f = drive
            .ingest_upload(None, vec![UploadItem::from_bytes("f.txt", b"x".to_vec())])
            .unwrap()
            .files[0];
        let mut view = ViewState::new();
        view.selection.enter_selecting();
        drive.click(&mut view, f).unwrap();

        let outcome = drive.move_selection(&mut view, Some(dest));

        assert!(outcome.is_complete());
        assert_eq!(drive.get(f).unwrap().parent_id, Some(dest));
        assert!(view.selection.is_empty());
        assert_eq!(view.selection.mode(), SelectionMode::Browse);
    }

    #[test]
    fn test_upload_limit_from_config() {
        let mut drive = Drive::new(DriveConfig {
            max_upload_bytes: Some(2),
            ..DriveConfig::default()
        });
        let report = drive
            .ingest_upload(None, vec![UploadItem::from_bytes("big", vec![0u8; 3])])
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert!(drive.store().is_empty());
    }
}
