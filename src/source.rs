use crate::error::Result;
use crate::filter::{FilterList, Listing};
use crate::http::PageRequest;
use crate::models::{BookInfo, ChapterInfo, DeepLink, PageContent, PagedResult, SourceMeta};

/// How one book-list page is retrieved. Resolved by the engine from the
/// caller's filters and listing choice; interpreted by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Free-text search. Takes precedence over any sort or listing choice.
    Search { query: String },
    /// A sort option, by index into the adapter's declared sort labels.
    /// Adapters route indices they don't map to their default listing.
    Sort { index: usize },
    /// A named listing such as "Latest".
    Listing { name: String },
    /// The adapter's primary listing.
    Default,
}

/// Outcome of scanning the first chapter-list response: the chapters it
/// carries and how many further pages remain to be fetched.
#[derive(Debug, Clone, Default)]
pub struct ChapterPlan {
    /// Chapters parsed from the discovery response itself.
    pub chapters: Vec<ChapterInfo>,
    /// Chapter-list pages still to fetch beyond the discovery response.
    pub remaining_pages: u32,
    /// Opaque adapter state (e.g. a numeric novel id) threaded into the
    /// remaining page requests.
    pub cursor: Option<String>,
}

impl ChapterPlan {
    /// A plan for sources whose whole chapter list fits in one response.
    pub fn single_page(chapters: Vec<ChapterInfo>) -> Self {
        Self {
            chapters,
            remaining_pages: 0,
            cursor: None,
        }
    }
}

/// Contract every site adapter implements. Request builders and parsers are
/// pure functions of their inputs: no network I/O, no hidden state. The
/// engine performs all fetching and drives these in fixed combinations.
pub trait Source: Send + Sync {
    fn meta(&self) -> &SourceMeta;

    /// Named retrieval modes this source offers. Static per source.
    fn listings(&self) -> Vec<Listing>;

    /// Query refinements this source understands. Static per source.
    fn filters(&self) -> FilterList;

    /// Deep links this source declares for the build-time manifest patcher.
    fn deep_links(&self) -> Vec<DeepLink> {
        Vec::new()
    }

    /// Application id handed to the build-time packaging step.
    fn application_id(&self) -> String {
        let slug: String = self
            .meta()
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        format!("ireader.{}", slug)
    }

    /// Build the request for one page of a book list under the given
    /// strategy, with this adapter's required headers applied.
    fn book_list_request(&self, strategy: &Strategy, page: u32) -> PageRequest;

    /// Parse one fetched book-list page for the strategy that requested it.
    fn parse_book_list(&self, strategy: &Strategy, body: &str) -> Result<PagedResult<BookInfo>>;

    fn details_request(&self, key: &str) -> PageRequest;

    fn parse_details(&self, body: &str) -> Result<BookInfo>;

    /// Request for the chapter-list discovery page of a book.
    fn chapters_request(&self, key: &str) -> PageRequest;

    /// Scan the discovery response: chapters on it, remaining page count,
    /// and any cursor the remaining page requests need.
    fn scan_chapter_pages(&self, body: &str) -> Result<ChapterPlan>;

    /// Request for one of the remaining chapter-list pages, `page` counting
    /// from 1. Single-page sources never see this called.
    fn chapter_page_request(&self, key: &str, cursor: Option<&str>, page: u32) -> PageRequest {
        let _ = (cursor, page);
        self.chapters_request(key)
    }

    /// Parse one of the remaining chapter-list pages.
    fn parse_chapter_page(&self, body: &str) -> Result<Vec<ChapterInfo>> {
        Ok(self.scan_chapter_pages(body)?.chapters)
    }

    fn content_request(&self, key: &str) -> PageRequest;

    /// Parse a chapter's readable content. Any cleanup of markup remnants
    /// must be deterministic and idempotent for identical input.
    fn parse_content(&self, body: &str) -> Result<PageContent>;
}
