//! Mutation Operations
//!
//! Validated create, rename, move and delete on the tree store. Every operation
//! checks its preconditions before committing anything, so a refused operation
//! leaves the store untouched.

use std::collections::HashSet;

use crate::entry::{Entry, EntryId};
use crate::error::{DriveError, Result};
use crate::store::TreeStore;

/// Per-item results of a batch operation. One rejected item never aborts the
/// rest of the batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub applied: Vec<EntryId>,
    pub rejected: Vec<(EntryId, DriveError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Trimmed, validated entry name.
pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DriveError::BlankName);
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(DriveError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

impl TreeStore {
    /// Ok when `folder_id` is the root or an existing folder.
    pub(crate) fn require_folder(&self, folder_id: Option<EntryId>) -> Result<()> {
        let Some(id) = folder_id else {
            return Ok(());
        };
        match self.get(id) {
            Some(entry) if entry.is_folder() => Ok(()),
            Some(_) => Err(DriveError::NotAFolder(id)),
            None => Err(DriveError::NotFound(id)),
        }
    }

    /// Create an empty folder under `parent_id` (`None` for the root).
    pub fn create_folder(&mut self, parent_id: Option<EntryId>, name: &str) -> Result<EntryId> {
        let name = validate_name(name)?;
        self.require_folder(parent_id)?;

        let id = self.insert(Entry::folder(name, parent_id));
        tracing::debug!("[DRIVE] Created folder {} under {:?}", id, parent_id);
        Ok(id)
    }

    pub fn rename(&mut self, id: EntryId, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        let entry = self.get_mut(id).ok_or(DriveError::NotFound(id))?;

        if entry.name == new_name {
            return Ok(());
        }

        tracing::debug!("[DRIVE] Renamed '{}' -> '{}'", entry.name, new_name);
        entry.name = new_name;
        entry.touch();
        Ok(())
    }

    /// Reparent `id` under `destination`.
    ///
    /// Refused when the destination is the entry itself or one of its
    /// descendants, is missing, or is a file. The subtree follows implicitly
    /// because children reference their parent by id.
    pub fn move_entry(&mut self, id: EntryId, destination: Option<EntryId>) -> Result<()> {
        if !self.contains(id) {
            return Err(DriveError::NotFound(id));
        }
        if let Some(dest) = destination {
            if self.is_descendant_or_self(id, dest) {
                tracing::warn!("[DRIVE] ❌ Cannot move {} into itself or its own child", id);
                return Err(DriveError::InvalidMoveTarget { id, destination: dest });
            }
        }
        self.require_folder(destination)?;

        let entry = self.get_mut(id).ok_or(DriveError::NotFound(id))?;
        entry.parent_id = destination;
        entry.touch();
        tracing::debug!("[DRIVE] Moved {} to {:?}", id, destination);
        Ok(())
    }

    pub fn move_many(&mut self, ids: &[EntryId], destination: Option<EntryId>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.move_entry(id, destination) {
                Ok(()) => outcome.applied.push(id),
                Err(e) => {
                    tracing::warn!("[DRIVE] Skipping move of {}: {}", id, e);
                    outcome.rejected.push((id, e));
                }
            }
        }
        tracing::info!(
            "[DRIVE] Moved {} item(s), {} rejected",
            outcome.applied.len(),
            outcome.rejected.len()
        );
        outcome
    }

    /// Delete `id` and its whole subtree in one step. Returns every removed id,
    /// `id` first.
    pub fn delete(&mut self, id: EntryId) -> Result<Vec<EntryId>> {
        if !self.contains(id) {
            return Err(DriveError::NotFound(id));
        }

        let mut removed = vec![id];
        removed.extend(self.descendants_of(id));

        let doomed: HashSet<EntryId> = removed.iter().copied().collect();
        self.remove_all(&doomed);
        tracing::debug!("[DRIVE] Deleted {} ({} entries)", id, removed.len());
        Ok(removed)
    }

    /// Delete each id independently. Ids already removed as part of an earlier
    /// item's subtree count as applied.
    pub fn delete_many(&mut self, ids: &[EntryId]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut gone: HashSet<EntryId> = HashSet::new();

        for &id in ids {
            if gone.contains(&id) {
                outcome.applied.push(id);
                continue;
            }
            match self.delete(id) {
                Ok(removed) => {
                    gone.extend(removed);
                    outcome.applied.push(id);
                }
                Err(e) => {
                    tracing::warn!("[DRIVE] Skipping delete of {}: {}", id, e);
                    outcome.rejected.push((id, e));
                }
            }
        }
        tracing::info!(
            "[DRIVE] Deleted {} item(s) ({} entries total), {} rejected",
            outcome.applied.len(),
            gone.len(),
            outcome.rejected.len()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Blob, FileData};

    fn add_file(store: &mut TreeStore, name: &str, parent: Option<EntryId>) -> EntryId {
        store.insert(Entry::file(name, parent, FileData::new(Blob::from(&b"data"[..]), "text/plain")))
    }

    #[test]
    fn test_create_folder_rejects_blank_names() {
        let mut store = TreeStore::new();
        assert!(matches!(store.create_folder(None, "   "), Err(DriveError::BlankName)));
        assert!(matches!(store.create_folder(None, ""), Err(DriveError::BlankName)));
        assert!(matches!(store.create_folder(None, "a/b"), Err(DriveError::InvalidName(_))));
        assert!(store.is_empty());

        let id = store.create_folder(None, "  Docs ").unwrap();
        assert_eq!(store.get(id).unwrap().name, "Docs");
    }

    #[test]
    fn test_dot_names_are_refused() {
        let mut store = TreeStore::new();
        for name in [".", "..", " .. "] {
            assert!(matches!(store.create_folder(None, name), Err(DriveError::InvalidName(_))));
        }
        assert!(store.is_empty());

        let id = store.create_folder(None, "a").unwrap();
        for name in [".", ".."] {
            assert!(matches!(store.rename(id, name), Err(DriveError::InvalidName(_))));
        }
        assert_eq!(store.get(id).unwrap().name, "a");

        // Dots inside a name are fine.
        store.rename(id, "..config").unwrap();
        store.create_folder(None, ".hidden").unwrap();
    }

    #[test]
    fn test_create_folder_requires_folder_parent() {
        let mut store = TreeStore::new();
        let file = add_file(&mut store, "a.txt", None);
        assert!(matches!(store.create_folder(Some(file), "x"), Err(DriveError::NotAFolder(_))));
        assert!(matches!(store.create_folder(Some(EntryId::new()), "x"), Err(DriveError::NotFound(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_sibling_names_are_allowed() {
        let mut store = TreeStore::new();
        store.create_folder(None, "Docs").unwrap();
        store.create_folder(None, "Docs").unwrap();
        assert_eq!(store.entries_in(None).len(), 2);
    }

    #[test]
    fn test_rename_touches_modified_at() {
        let mut store = TreeStore::new();
        let id = store.create_folder(None, "Docs").unwrap();
        let before = store.get(id).unwrap().modified_at;

        assert!(matches!(store.rename(id, " "), Err(DriveError::BlankName)));
        assert_eq!(store.get(id).unwrap().name, "Docs");

        store.rename(id, "Documents").unwrap();
        let entry = store.get(id).unwrap();
        assert_eq!(entry.name, "Documents");
        assert!(entry.modified_at >= before);

        assert!(matches!(store.rename(EntryId::new(), "x"), Err(DriveError::NotFound(_))));
    }

    #[test]
    fn test_move_rejects_self_and_descendants() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let b = store.create_folder(Some(a), "b").unwrap();
        let c = store.create_folder(Some(b), "c").unwrap();

        for dest in [a, b, c] {
            assert!(matches!(
                store.move_entry(a, Some(dest)),
                Err(DriveError::InvalidMoveTarget { .. })
            ));
        }
        assert_eq!(store.get(a).unwrap().parent_id, None);
    }

    #[test]
    fn test_move_carries_subtree() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let b = store.create_folder(Some(a), "b").unwrap();
        let f = add_file(&mut store, "f.txt", Some(b));
        let target = store.create_folder(None, "target").unwrap();

        store.move_entry(b, Some(target)).unwrap();

        assert_eq!(store.get(b).unwrap().parent_id, Some(target));
        assert_eq!(store.get(f).unwrap().parent_id, Some(b));
        assert!(store.descendants_of(target).contains(&f));
        assert!(store.entries_in(Some(a)).is_empty());
    }

    #[test]
    fn test_move_into_file_or_missing_is_refused() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let file = add_file(&mut store, "f.txt", None);

        assert!(matches!(store.move_entry(a, Some(file)), Err(DriveError::NotAFolder(_))));
        assert!(matches!(store.move_entry(a, Some(EntryId::new())), Err(DriveError::NotFound(_))));
        assert!(matches!(store.move_entry(EntryId::new(), None), Err(DriveError::NotFound(_))));
    }

    #[test]
    fn test_move_many_applies_valid_items() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let inner = store.create_folder(Some(a), "inner").unwrap();
        let loose = add_file(&mut store, "loose.txt", None);

        let outcome = store.move_many(&[a, loose], Some(inner));

        assert_eq!(outcome.applied, vec![loose]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, a);
        assert_eq!(store.get(loose).unwrap().parent_id, Some(inner));
        assert_eq!(store.get(a).unwrap().parent_id, None);
    }

    #[test]
    fn test_delete_cascades() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let b = store.create_folder(Some(a), "b").unwrap();
        let f = add_file(&mut store, "f.txt", Some(b));
        let keep = add_file(&mut store, "keep.txt", None);

        let removed = store.delete(a).unwrap();

        assert_eq!(removed[0], a);
        assert_eq!(removed.len(), 3);
        for id in [a, b, f] {
            assert!(!store.contains(id));
        }
        assert!(store.contains(keep));
        assert!(store.entries().iter().all(|e| e.parent_id.map_or(true, |p| !removed.contains(&p))));
    }

    #[test]
    fn test_delete_stale_id_is_noop() {
        let mut store = TreeStore::new();
        add_file(&mut store, "f.txt", None);
        assert!(matches!(store.delete(EntryId::new()), Err(DriveError::NotFound(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_many_counts_nested_ids_as_applied() {
        let mut store = TreeStore::new();
        let a = store.create_folder(None, "a").unwrap();
        let f = add_file(&mut store, "f.txt", Some(a));
        let stale = EntryId::new();

        let outcome = store.delete_many(&[a, f, stale]);

        assert_eq!(outcome.applied, vec![a, f]);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(!outcome.is_complete());
        assert!(store.is_empty());
    }
}
