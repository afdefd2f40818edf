use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterList, Listing};
use crate::http::PageRequest;
use crate::models::{BookInfo, ChapterInfo, PageContent, PagedResult, SourceMeta};
use crate::source::{ChapterPlan, Source, Strategy};

const BASE_URL: &str = "https://www.koreanmtl.online";
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36";

/// KoreanMtl.Online - single static listing page, single-page chapter lists.
pub struct KoreanOnline {
    meta: SourceMeta,
}

impl KoreanOnline {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                id: 14204738993432853,
                name: "KoreanMtl.Online",
                base_url: BASE_URL,
                lang: "en",
            },
        }
    }

    fn request(&self, url: String) -> PageRequest {
        PageRequest::get(url)
            .header("User-Agent", USER_AGENT)
            .header("Cache-Control", "max-age=0")
            .header("Referer", BASE_URL)
    }
}

impl Default for KoreanOnline {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for KoreanOnline {
    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn listings(&self) -> Vec<Listing> {
        vec![Listing::new("Latest")]
    }

    fn filters(&self) -> FilterList {
        FilterList::new(vec![Filter::title(), Filter::sort("Sort By:", &["Latest"])])
    }

    fn application_id(&self) -> String {
        "ireader.koreanonline".to_string()
    }

    fn book_list_request(&self, _strategy: &Strategy, _page: u32) -> PageRequest {
        // The site has no search endpoint and only one listing; every
        // strategy serves the same static listing page.
        self.request(format!("{}/p/novels-listing.html", BASE_URL))
    }

    fn parse_book_list(&self, _strategy: &Strategy, body: &str) -> Result<PagedResult<BookInfo>> {
        let document = Html::parse_document(body);
        let row = Selector::parse("ul.a li.b").unwrap();
        let link = Selector::parse("a").unwrap();
        let items: Vec<BookInfo> = document
            .select(&row)
            .filter_map(|element| {
                let anchor = element.select(&link).next()?;
                Some(BookInfo {
                    title: text_of(anchor),
                    key: anchor.value().attr("href").unwrap_or("").to_string(),
                    ..Default::default()
                })
            })
            .collect();
        // One static page; there is never a next one.
        Ok(PagedResult::new(items, false))
    }

    fn details_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_details(&self, body: &str) -> Result<BookInfo> {
        let document = Html::parse_document(body);
        let container = Selector::parse("div.post-body").unwrap();
        if document.select(&container).next().is_none() {
            return Err(Error::parse(self.meta.id, "details", "missing div.post-body"));
        }

        let paragraph = Selector::parse("div.post-body p").unwrap();
        let description = document
            .select(&paragraph)
            .map(text_of)
            .collect::<Vec<_>>()
            .join("\n");

        // The site exposes nothing but the synopsis on a book page; the
        // caller keeps its own title and key.
        Ok(BookInfo {
            description: non_empty(description),
            ..Default::default()
        })
    }

    fn chapters_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn scan_chapter_pages(&self, body: &str) -> Result<ChapterPlan> {
        let document = Html::parse_document(body);
        let row = Selector::parse("div.post-body ul.a li.a").unwrap();
        let link = Selector::parse("a").unwrap();
        let chapters = document
            .select(&row)
            .filter_map(|element| {
                let anchor = element.select(&link).next()?;
                let href = anchor.value().attr("href").unwrap_or("");
                let path = href.strip_prefix(BASE_URL).unwrap_or(href);
                Some(ChapterInfo {
                    key: format!("{}{}", BASE_URL, path),
                    name: text_of(anchor),
                    date_upload: None,
                })
            })
            .collect();
        Ok(ChapterPlan::single_page(chapters))
    }

    fn content_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_content(&self, body: &str) -> Result<PageContent> {
        let document = Html::parse_document(body);
        let block = Selector::parse("h1, p").unwrap();
        let blocks: Vec<String> = document
            .select(&block)
            .map(text_of)
            .filter(|t| !t.is_empty())
            .collect();
        if blocks.is_empty() {
            return Err(Error::parse(self.meta.id, "content", "no readable blocks"));
        }
        Ok(PageContent::new(blocks))
    }
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r#"
        <html><body>
        <ul class="a">
          <li class="b"><a href="https://www.koreanmtl.online/2023/05/novel-one.html">Novel One</a></li>
          <li class="b"><a href="https://www.koreanmtl.online/2023/06/novel-two.html">Novel Two</a></li>
        </ul>
        </body></html>"#;

    const BOOK_PAGE: &str = r#"
        <html><body>
        <div class="post-body">
          <p>A regressor returns.</p>
          <p>Everything changes.</p>
          <ul class="a">
            <li class="a"><a href="/2023/05/chapter-1.html">Chapter 1</a></li>
            <li class="a"><a href="https://www.koreanmtl.online/2023/05/chapter-2.html">Chapter 2</a></li>
          </ul>
        </div>
        </body></html>"#;

    fn source() -> KoreanOnline {
        KoreanOnline::new()
    }

    #[test]
    fn every_strategy_serves_the_listing_page() {
        let src = source();
        let listing_url = "https://www.koreanmtl.online/p/novels-listing.html";
        let search = Strategy::Search {
            query: "anything".to_string(),
        };
        assert_eq!(src.book_list_request(&search, 1).url, listing_url);
        assert_eq!(
            src.book_list_request(&Strategy::Sort { index: 5 }, 1).url,
            listing_url
        );
        assert_eq!(
            src.book_list_request(&Strategy::Default, 3).url,
            listing_url
        );
    }

    #[test]
    fn listing_parses_rows_without_claiming_more_pages() {
        let result = source()
            .parse_book_list(&Strategy::Default, LISTING_PAGE)
            .unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].title, "Novel One");
        assert_eq!(
            result.items[0].key,
            "https://www.koreanmtl.online/2023/05/novel-one.html"
        );
        assert!(!result.has_next_page);
    }

    #[test]
    fn details_carry_only_the_synopsis() {
        let book = source().parse_details(BOOK_PAGE).unwrap();
        assert_eq!(
            book.description.as_deref(),
            Some("A regressor returns.\nEverything changes.")
        );
        assert!(book.title.is_empty());
    }

    #[test]
    fn details_without_post_body_are_a_parse_error() {
        assert!(source().parse_details("<html></html>").is_err());
    }

    #[test]
    fn chapter_list_is_single_page() {
        let plan = source().scan_chapter_pages(BOOK_PAGE).unwrap();
        assert_eq!(plan.remaining_pages, 0);
        assert_eq!(plan.chapters.len(), 2);
        assert_eq!(plan.chapters[0].name, "Chapter 1");
        assert_eq!(
            plan.chapters[0].key,
            "https://www.koreanmtl.online/2023/05/chapter-1.html"
        );
        assert_eq!(
            plan.chapters[1].key,
            "https://www.koreanmtl.online/2023/05/chapter-2.html"
        );
    }

    #[test]
    fn content_collects_heading_and_paragraphs() {
        let page = r#"<html><body>
            <h1>Chapter 1</h1>
            <p>First line.</p>
            <p></p>
            <p>Second line.</p>
        </body></html>"#;
        let content = source().parse_content(page).unwrap();
        assert_eq!(content.blocks, vec!["Chapter 1", "First line.", "Second line."]);
    }
}
