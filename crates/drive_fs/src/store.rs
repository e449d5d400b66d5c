//! Tree Store
//!
//! The authoritative, flat collection of drive entries. Parent/child structure is
//! expressed only through `Entry::parent_id`; children are always derived by
//! filtering the full collection, so a move or delete only ever has to touch the
//! entries it changes.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::entry::{Entry, EntryId};

/// Default label of the root crumb.
pub const ROOT_LABEL: &str = "Home";

/// One step of a breadcrumb trail. The root crumb has `id == None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub id: Option<EntryId>,
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct TreeStore {
    entries: Vec<Entry>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full entry list, in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Entries whose parent is `folder_id` (`None` for the root).
    pub fn entries_in(&self, folder_id: Option<EntryId>) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.parent_id == folder_id)
            .collect()
    }

    /// Transitive closure of the children of `id`, breadth first.
    ///
    /// Each entry is visited at most once, so a malformed (cyclic) parent graph
    /// terminates instead of looping. `id` itself is never part of the result.
    pub fn descendants_of(&self, id: EntryId) -> Vec<EntryId> {
        let mut visited: HashSet<EntryId> = HashSet::new();
        visited.insert(id);

        let mut queue = VecDeque::from([id]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in self.entries.iter().filter(|e| e.parent_id == Some(current)) {
                if visited.insert(child.id) {
                    result.push(child.id);
                    queue.push_back(child.id);
                } else {
                    tracing::warn!("[DRIVE] Cycle detected below {} at {}", id, child.id);
                }
            }
        }

        result
    }

    /// True when `candidate` is `id` or lies anywhere below it.
    pub fn is_descendant_or_self(&self, id: EntryId, candidate: EntryId) -> bool {
        if id == candidate {
            return true;
        }

        // Walking upward from the candidate is cheaper than building the closure.
        let mut seen = HashSet::new();
        let mut cursor = self.get(candidate).and_then(|e| e.parent_id);
        while let Some(current) = cursor {
            if current == id {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            cursor = self.get(current).and_then(|e| e.parent_id);
        }
        false
    }

    /// Breadcrumb trail from the root down to `folder_id`, using [`ROOT_LABEL`]
    /// for the root crumb.
    pub fn breadcrumb_for(&self, folder_id: Option<EntryId>) -> Vec<Crumb> {
        self.breadcrumb_with_root(folder_id, ROOT_LABEL)
    }

    /// Breadcrumb trail with a custom root label.
    ///
    /// Unknown ids stop the walk, so a stale id yields just the root crumb plus
    /// whatever could still be resolved.
    pub fn breadcrumb_with_root(&self, folder_id: Option<EntryId>, root_label: &str) -> Vec<Crumb> {
        let mut crumbs = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = folder_id;

        while let Some(id) = cursor {
            if !seen.insert(id) {
                tracing::warn!("[DRIVE] Cycle detected while resolving breadcrumb for {}", id);
                break;
            }
            let Some(entry) = self.get(id) else {
                break;
            };
            crumbs.push(Crumb {
                id: Some(entry.id),
                name: entry.name.clone(),
            });
            cursor = entry.parent_id;
        }

        crumbs.push(Crumb {
            id: None,
            name: root_label.to_string(),
        });
        crumbs.reverse();
        crumbs
    }

    /// Case-insensitive substring search over every entry name.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&query))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Raw mutation, used by the validated operations in `operations` / `ingest`
    // ------------------------------------------------------------------------

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn insert(&mut self, entry: Entry) -> EntryId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub(crate) fn extend(&mut self, entries: Vec<Entry>) {
        self.entries.extend(entries);
    }

    /// Removes every listed id in a single pass.
    pub(crate) fn remove_all(&mut self, ids: &HashSet<EntryId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id));
        before - self.entries.len()
    }
}
