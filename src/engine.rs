use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{FilterList, Listing};
use crate::http::{HttpClient, PageRequest, Transport};
use crate::models::{BookInfo, ChapterInfo, PageContent, PagedResult};
use crate::source::{Source, Strategy};

/// Pick the retrieval strategy for a book-list request.
///
/// A non-blank title filter always wins, regardless of any sort or listing
/// also present. Otherwise a selected sort option is routed by index, and
/// only then does the selected listing (or the adapter default) apply.
pub fn resolve_strategy(filters: &FilterList, listing: Option<&Listing>) -> Strategy {
    if let Some(query) = filters.title_query() {
        let query = query.trim();
        if !query.is_empty() {
            return Strategy::Search {
                query: query.to_string(),
            };
        }
    }
    if let Some(index) = filters.sort_selection() {
        return Strategy::Sort { index };
    }
    match listing {
        Some(listing) => Strategy::Listing {
            name: listing.name.clone(),
        },
        None => Strategy::Default,
    }
}

/// Generic orchestration over source adapters: query dispatch, listing
/// pagination, concurrent chapter-page aggregation, and content assembly.
/// Holds no entity state; every call returns a fresh value.
pub struct Engine {
    transport: Arc<dyn Transport>,
}

impl Engine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Engine backed by the default HTTP transport, configured from
    /// `config.toml` when present.
    pub fn with_default_transport() -> std::result::Result<Self, reqwest::Error> {
        let config = Config::load();
        Ok(Self::new(Arc::new(HttpClient::with_config(config.http)?)))
    }

    async fn fetch(
        &self,
        source: &dyn Source,
        operation: &'static str,
        request: &PageRequest,
    ) -> Result<String> {
        log::debug!("{}: {} {}", source.meta().name, operation, request.url);
        let response =
            self.transport
                .execute(request)
                .await
                .map_err(|e| Error::Transport {
                    source_id: source.meta().id,
                    operation,
                    source: e,
                })?;
        Ok(response.body)
    }

    /// One page of a book list, resolved from the caller's filters and
    /// listing choice. The parsed result is returned unchanged.
    pub async fn book_list(
        &self,
        source: &Arc<dyn Source>,
        filters: &FilterList,
        listing: Option<&Listing>,
        page: u32,
    ) -> Result<PagedResult<BookInfo>> {
        let strategy = resolve_strategy(filters, listing);
        let request = source.book_list_request(&strategy, page);
        let body = self.fetch(source.as_ref(), "book_list", &request).await?;
        source.parse_book_list(&strategy, &body)
    }

    /// Full detail fields for one book.
    pub async fn book_details(&self, source: &Arc<dyn Source>, key: &str) -> Result<BookInfo> {
        let request = source.details_request(key);
        let body = self.fetch(source.as_ref(), "details", &request).await?;
        source.parse_details(&body)
    }

    /// The complete chapter list of a book.
    ///
    /// The first response discovers how many pages the list spans. Remaining
    /// pages are fetched concurrently and merged by page index, never by
    /// completion order. Any sub-fetch failure fails the whole call: either
    /// all chapters are returned or none.
    pub async fn chapter_list(
        &self,
        source: &Arc<dyn Source>,
        book: &BookInfo,
    ) -> Result<Vec<ChapterInfo>> {
        let source_id = source.meta().id;
        let request = source.chapters_request(&book.key);
        let body = self
            .fetch(source.as_ref(), "chapter_list", &request)
            .await?;
        let plan = source.scan_chapter_pages(&body)?;

        if plan.remaining_pages == 0 {
            return Ok(plan.chapters);
        }

        log::debug!(
            "{}: fetching {} more chapter pages for {}",
            source.meta().name,
            plan.remaining_pages,
            book.key
        );

        let mut tasks = JoinSet::new();
        for page in 1..=plan.remaining_pages {
            let transport = Arc::clone(&self.transport);
            let source = Arc::clone(source);
            let key = book.key.clone();
            let cursor = plan.cursor.clone();
            tasks.spawn(async move {
                let request = source.chapter_page_request(&key, cursor.as_deref(), page);
                let parsed = match transport.execute(&request).await {
                    Ok(response) => source.parse_chapter_page(&response.body),
                    Err(e) => Err(Error::Transport {
                        source_id: source.meta().id,
                        operation: "chapter_page",
                        source: e,
                    }),
                };
                (page, parsed)
            });
        }

        // Merge by page index, not completion order.
        let mut slots: Vec<Option<Vec<ChapterInfo>>> = vec![None; plan.remaining_pages as usize];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page, Ok(chapters))) => slots[(page - 1) as usize] = Some(chapters),
                Ok((_, Err(err))) => {
                    tasks.abort_all();
                    return Err(Error::Aggregation {
                        source_id,
                        source: Box::new(err),
                    });
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(Error::Aggregation {
                        source_id,
                        source: Box::new(Error::parse(
                            source_id,
                            "chapter_page",
                            join_err.to_string(),
                        )),
                    });
                }
            }
        }

        let mut chapters = plan.chapters;
        for slot in slots {
            chapters.extend(slot.unwrap_or_default());
        }
        Ok(chapters)
    }

    /// Readable content of one chapter. One chapter maps to exactly one
    /// fetch.
    pub async fn page_content(
        &self,
        source: &Arc<dyn Source>,
        chapter: &ChapterInfo,
    ) -> Result<PageContent> {
        let request = source.content_request(&chapter.key);
        let body = self.fetch(source.as_ref(), "content", &request).await?;
        source.parse_content(&body)
    }
}
