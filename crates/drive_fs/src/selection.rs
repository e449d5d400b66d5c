//! Selection and view state
//!
//! A view owns its cursor (the folder being shown) and a selection controller.
//! Nothing here is global: each caller keeps its own [`ViewState`] and hands it
//! to the drive when an operation needs to know what is selected or where the
//! user is.

use serde::Serialize;

use crate::entry::{Entry, EntryId};
use crate::error::{DriveError, Result};
use crate::store::{Crumb, TreeStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SelectionMode {
    /// Clicking a file activates it, clicking a folder opens it.
    #[default]
    Browse,
    /// Clicking any entry toggles its membership in the selection.
    Selecting,
}

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Navigated(EntryId),
    Activated(EntryId),
    Toggled { id: EntryId, selected: bool },
}

#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    mode: SelectionMode,
    active: Option<EntryId>,
    // Kept in selection order; exports and batch operations follow it.
    selected: Vec<EntryId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_selecting(&self) -> bool {
        self.mode == SelectionMode::Selecting
    }

    /// The file last activated in Browse mode.
    pub fn active(&self) -> Option<EntryId> {
        self.active
    }

    pub fn selected_ids(&self) -> &[EntryId] {
        &self.selected
    }

    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Switch to Selecting. The Browse-mode active file does not carry over.
    pub fn enter_selecting(&mut self) {
        self.mode = SelectionMode::Selecting;
        self.active = None;
    }

    /// Flip between Browse and Selecting. Leaving Selecting drops the selection.
    pub fn toggle_mode(&mut self) {
        match self.mode {
            SelectionMode::Browse => self.enter_selecting(),
            SelectionMode::Selecting => self.clear(),
        }
    }

    /// Back to Browse with nothing selected.
    pub fn clear(&mut self) {
        self.mode = SelectionMode::Browse;
        self.selected.clear();
    }

    /// Add or remove `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: EntryId) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(id);
            true
        }
    }

    /// Entries for the selected ids that still exist, in selection order.
    pub fn resolve<'a>(&self, store: &'a TreeStore) -> Vec<&'a Entry> {
        self.selected.iter().filter_map(|id| store.get(*id)).collect()
    }

    /// Drop ids that are no longer in the store.
    pub fn prune(&mut self, store: &TreeStore) {
        self.selected.retain(|id| store.contains(*id));
        if self.active.is_some_and(|id| !store.contains(id)) {
            self.active = None;
        }
    }
}

// ============================================================================
// VIEW STATE
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct ViewState {
    cursor: Option<EntryId>,
    pub selection: SelectionController,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folder being shown; `None` is the root.
    pub fn cursor(&self) -> Option<EntryId> {
        self.cursor
    }

    /// Open `folder`. Changing folders always clears the selection.
    pub fn navigate(&mut self, store: &TreeStore, folder: Option<EntryId>) -> Result<()> {
        store.require_folder(folder)?;
        if self.cursor != folder {
            self.selection.clear();
            self.selection.active = None;
        }
        self.cursor = folder;
        Ok(())
    }

    pub fn click(&mut self, store: &TreeStore, id: EntryId) -> Result<ClickOutcome> {
        let entry = store.get(id).ok_or(DriveError::NotFound(id))?;

        if self.selection.is_selecting() {
            let selected = self.selection.toggle(id);
            return Ok(ClickOutcome::Toggled { id, selected });
        }

        if entry.is_folder() {
            self.navigate(store, Some(id))?;
            Ok(ClickOutcome::Navigated(id))
        } else {
            self.selection.active = Some(id);
            Ok(ClickOutcome::Activated(id))
        }
    }

    /// Select every entry of the current folder, entering Selecting mode.
    pub fn select_all(&mut self, store: &TreeStore) {
        self.selection.enter_selecting();
        for entry in store.entries_in(self.cursor) {
            if !self.selection.is_selected(entry.id) {
                self.selection.selected.push(entry.id);
            }
        }
    }

    /// Re-anchor after entries were removed from the store.
    ///
    /// `trail` is the cursor's breadcrumb captured before the removal. When the
    /// cursor itself is gone it falls back to the deepest crumb that survived,
    /// or the root.
    pub fn reconcile(&mut self, store: &TreeStore, trail: &[Crumb]) {
        self.selection.prune(store);

        let Some(cursor) = self.cursor else {
            return;
        };
        if store.contains(cursor) {
            return;
        }

        let fallback = trail
            .iter()
            .rev()
            .filter_map(|crumb| crumb.id)
            .find(|id| store.contains(*id));
        tracing::debug!("[DRIVE] Cursor {} was removed, retreating to {:?}", cursor, fallback);

        self.cursor = fallback;
        self.selection.clear();
    }
}
