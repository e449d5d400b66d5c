use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryId};
use crate::path_resolver::FileType;
use crate::store::TreeStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Modified,
    Size,
    Type,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub sort_by: SortBy,
    pub order: SortOrder,
    /// Case-insensitive name filter; empty matches everything.
    pub filter: String,
    pub show_hidden: bool,
}

/// Entries of `folder` filtered and sorted for display. Folders always come
/// first regardless of sort order.
pub fn list_folder<'a>(store: &'a TreeStore, folder: Option<EntryId>, options: &ListOptions) -> Vec<&'a Entry> {
    let filter = options.filter.to_lowercase();

    let mut items: Vec<&Entry> = store
        .entries_in(folder)
        .into_iter()
        .filter(|e| options.show_hidden || !e.name.starts_with('.'))
        .filter(|e| filter.is_empty() || e.name.to_lowercase().contains(&filter))
        .collect();

    items.sort_by(|a, b| {
        let cmp = match options.sort_by {
            SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::Modified => a.modified_at.cmp(&b.modified_at),
            SortBy::Size => a.size_bytes().cmp(&b.size_bytes()),
            SortBy::Type => FileType::of(a).display_name().cmp(FileType::of(b).display_name()),
        };

        match options.order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });

    // Folders first; the sort is stable so the order above is kept per group.
    items.sort_by_key(|e| !e.is_folder());
    items
}
