//! Path Resolver
//!
//! Pure helpers that turn entry attributes into human readable locations,
//! sizes and type/icon metadata. Used for breadcrumbs, move-target pickers and
//! search results.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::entry::{Entry, EntryId};
use crate::store::{Crumb, TreeStore};

const BREADCRUMB_SEPARATOR: &str = " / ";

// ============================================================================
// FILE TYPE - Display classification by extension
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FileType {
    Folder,
    Image,
    Audio,
    Video,
    Document,    // .pdf, .doc, .docx, .odt
    Spreadsheet, // .xls, .xlsx, .csv, .ods
    Slides,      // .ppt, .pptx, .odp
    Archive,     // .zip, .tar, .gz, .7z
    Code,
    Text,
    Other,
}

impl FileType {
    pub fn of(entry: &Entry) -> Self {
        if entry.is_folder() {
            FileType::Folder
        } else {
            Self::from_name(&entry.name)
        }
    }

    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp") => FileType::Image,
            Some("wav" | "mp3" | "ogg" | "flac" | "m4a") => FileType::Audio,
            Some("mp4" | "webm" | "avi" | "mov" | "mkv") => FileType::Video,
            Some("pdf" | "doc" | "docx" | "odt" | "rtf") => FileType::Document,
            Some("xls" | "xlsx" | "csv" | "ods") => FileType::Spreadsheet,
            Some("ppt" | "pptx" | "odp") => FileType::Slides,
            Some("zip" | "tar" | "gz" | "7z" | "rar") => FileType::Archive,
            Some("rs" | "js" | "ts" | "py" | "java" | "c" | "cpp" | "h" | "go" | "html" | "css" | "json" | "toml" | "yaml" | "yml") => FileType::Code,
            Some("txt" | "md" | "log") => FileType::Text,
            _ => FileType::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FileType::Folder => "Folder",
            FileType::Image => "Image",
            FileType::Audio => "Audio",
            FileType::Video => "Video",
            FileType::Document => "Document",
            FileType::Spreadsheet => "Spreadsheet",
            FileType::Slides => "Presentation",
            FileType::Archive => "Archive",
            FileType::Code => "Source",
            FileType::Text => "Text",
            FileType::Other => "File",
        }
    }

    /// Icon name for presentation layers.
    pub fn icon(&self) -> &'static str {
        match self {
            FileType::Folder => "folder",
            FileType::Image => "file-image",
            FileType::Audio => "file-audio",
            FileType::Video => "file-video",
            FileType::Document => "file-text",
            FileType::Spreadsheet => "file-spreadsheet",
            FileType::Slides => "file-slides",
            FileType::Archive => "file-archive",
            FileType::Code => "file-code",
            FileType::Text => "file-text",
            FileType::Other => "file",
        }
    }
}

fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Best-effort mime type from a file name.
pub fn guess_mime(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        Some("html") => "text/html",
        Some("md") => "text/markdown",
        Some("txt" | "log") => "text/plain",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Binary-unit size label ("1.50 KB"); plain bytes below 1 KB.
pub fn format_file_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if size < 1024 {
        return format!("{} B", size);
    }

    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Local-time label such as "Mar 09, 2024 14:05".
pub fn format_modified_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%b %d, %Y %H:%M").to_string()
}

/// Display metadata for one entry.
#[derive(Clone, Debug, Serialize)]
pub struct EntryDisplay {
    pub name: String,
    pub file_type: FileType,
    pub type_name: &'static str,
    pub icon: &'static str,
    /// Formatted size; empty for folders.
    pub size: String,
    pub modified: String,
}

pub fn describe(entry: &Entry) -> EntryDisplay {
    let file_type = FileType::of(entry);
    EntryDisplay {
        name: entry.name.clone(),
        file_type,
        type_name: file_type.display_name(),
        icon: file_type.icon(),
        size: if entry.is_folder() {
            String::new()
        } else {
            format_file_size(entry.size_bytes())
        },
        modified: format_modified_time(entry.modified_at),
    }
}

// ============================================================================
// LOCATIONS
// ============================================================================

/// "Home / a / b" style rendering of a breadcrumb trail.
pub fn display_path(crumbs: &[Crumb]) -> String {
    crumbs
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEPARATOR)
}

/// Human readable location of the folder containing `id`, e.g. "Home / a".
pub fn location_of(store: &TreeStore, id: EntryId, root_label: &str) -> Option<String> {
    let entry = store.get(id)?;
    Some(display_path(&store.breadcrumb_with_root(entry.parent_id, root_label)))
}

/// Slash separated path of `id` relative to the root, e.g. "a/b/file.txt".
pub fn full_path(store: &TreeStore, id: EntryId) -> Option<String> {
    let entry = store.get(id)?;
    let mut parts: Vec<String> = store
        .breadcrumb_for(entry.parent_id)
        .into_iter()
        .skip(1)
        .map(|c| c.name)
        .collect();
    parts.push(entry.name.clone());
    Some(parts.join("/"))
}
