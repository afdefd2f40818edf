use serde::{Deserialize, Serialize};

/// Identity of one content source. Immutable after construction; one instance
/// per source for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMeta {
    pub id: i64,
    pub name: &'static str,
    pub base_url: &'static str,
    pub lang: &'static str,
}

/// Publication status of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ongoing,
    Completed,
    #[default]
    Unknown,
}

impl Status {
    /// Normalize a site status label. Total: labels nobody recognizes map to
    /// `Unknown` rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "OnGoing" | "Ongoing" | "ongoing" => Status::Ongoing,
            "Complete" | "Completed" | "completed" => Status::Completed,
            _ => Status::Unknown,
        }
    }
}

/// One book as a source exposes it. A fetch always produces a full
/// replacement value; fields are never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    /// Opaque stable identifier, usually the canonical page URL.
    pub key: String,
    pub title: String,
    pub cover: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub status: Status,
}

/// One chapter entry. Order is the site-defined order as parsed; the engine
/// never re-sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterInfo {
    /// Identifier/address used to fetch the chapter content.
    pub key: String,
    pub name: String,
    /// Upload time in epoch millis; `None` when the site date is unparseable.
    pub date_upload: Option<i64>,
}

/// Readable content of one chapter as ordered text blocks. The first block
/// is conventionally the chapter heading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub blocks: Vec<String>,
}

impl PageContent {
    pub fn new(blocks: Vec<String>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// One page of results plus whether another page exists. `has_next_page` is
/// only set from positive evidence in the response, never defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, has_next_page: bool) -> Self {
        Self {
            items,
            has_next_page,
        }
    }
}

/// Deep-link filter data a packaged source declares for the build-time
/// manifest patcher. Empty fields are omitted from the generated filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub scheme: String,
    pub host: String,
    pub path_pattern: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(Status::from_label("OnGoing"), Status::Ongoing);
        assert_eq!(Status::from_label("Ongoing"), Status::Ongoing);
        assert_eq!(Status::from_label("Complete"), Status::Completed);
        assert_eq!(Status::from_label("Completed"), Status::Completed);
        assert_eq!(Status::from_label("  Completed  "), Status::Completed);
        assert_eq!(Status::from_label("Hiatus"), Status::Unknown);
        assert_eq!(Status::from_label(""), Status::Unknown);
        assert_eq!(Status::from_label("???"), Status::Unknown);
    }

    #[test]
    fn book_info_defaults_to_unknown_status() {
        let book = BookInfo::default();
        assert_eq!(book.status, Status::Unknown);
        assert!(book.genres.is_empty());
    }
}
