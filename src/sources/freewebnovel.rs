use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterList, Listing};
use crate::http::PageRequest;
use crate::models::{
    BookInfo, ChapterInfo, DeepLink, PageContent, PagedResult, SourceMeta, Status,
};
use crate::source::{ChapterPlan, Source, Strategy};

const BASE_URL: &str = "https://freewebnovel.com";
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36";

/// FreeWebnovel - HTML novel site with a paginated chapter index per book.
pub struct FreeWebnovel {
    meta: SourceMeta,
}

impl FreeWebnovel {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                id: 1420473899634853,
                name: "FreeWebnovel",
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

    fn latest_from_element(element: ElementRef) -> BookInfo {
        BookInfo {
            title: select_attr(element, "div.txt a", "title"),
            key: format!("{}{}", BASE_URL, select_attr(element, "div.txt a", "href")),
            cover: non_empty(select_attr(element, "div.pic img", "src")),
            ..Default::default()
        }
    }

    fn popular_from_element(element: ElementRef) -> BookInfo {
        BookInfo {
            title: select_attr(element, "a", "title"),
            key: format!("{}{}", BASE_URL, select_attr(element, "a", "href")),
            cover: non_empty(select_attr(element, "img", "src")),
            ..Default::default()
        }
    }

    fn search_from_element(element: ElementRef) -> BookInfo {
        BookInfo {
            title: select_attr(element, "div.txt a", "title"),
            key: format!("{}{}", BASE_URL, select_attr(element, "div.txt a", "href")),
            cover: non_empty(select_attr(element, "div.pic img", "src")),
            ..Default::default()
        }
    }

    fn chapters_from(document: &Html) -> Vec<ChapterInfo> {
        let row = Selector::parse("div.m-newest2 ul.ul-list5 li").unwrap();
        document
            .select(&row)
            .map(|element| {
                let href = select_attr(element, "a", "href");
                let path = href.strip_prefix(BASE_URL).unwrap_or(&href).to_string();
                ChapterInfo {
                    key: format!("{}{}", BASE_URL, path),
                    name: select_attr(element, "a", "title"),
                    date_upload: None,
                }
            })
            .collect()
    }
}

impl Default for FreeWebnovel {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for FreeWebnovel {
    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn listings(&self) -> Vec<Listing> {
        vec![Listing::new("Latest")]
    }

    fn filters(&self) -> FilterList {
        FilterList::new(vec![
            Filter::title(),
            Filter::sort("Sort By:", &["Latest", "Popular"]),
        ])
    }

    fn deep_links(&self) -> Vec<DeepLink> {
        vec![DeepLink {
            scheme: "https".to_string(),
            host: "freewebnovel.com".to_string(),
            path_pattern: "/..*".to_string(),
            path: String::new(),
        }]
    }

    fn book_list_request(&self, strategy: &Strategy, page: u32) -> PageRequest {
        match strategy {
            Strategy::Search { query } => {
                self.request(format!("{}/search/?searchkey={}", BASE_URL, query))
            }
            Strategy::Sort { index: 1 } => {
                self.request(format!("{}/most-popular-novel/", BASE_URL))
            }
            // Unmapped sort indices and every listing route to latest.
            _ => self.request(format!("{}/latest-release-novel/{}/", BASE_URL, page)),
        }
    }

    fn parse_book_list(&self, strategy: &Strategy, body: &str) -> Result<PagedResult<BookInfo>> {
        let document = Html::parse_document(body);
        match strategy {
            Strategy::Search { .. } => {
                let row = Selector::parse("div.ul-list1 div.li-row").unwrap();
                let items = document
                    .select(&row)
                    .map(Self::search_from_element)
                    .collect();
                Ok(PagedResult::new(items, false))
            }
            Strategy::Sort { index: 1 } => {
                let row = Selector::parse("div.ul-list1 div.li-row").unwrap();
                let items = document
                    .select(&row)
                    .map(Self::popular_from_element)
                    .collect();
                Ok(PagedResult::new(items, false))
            }
            _ => {
                let row = Selector::parse("div.ul-list1 div.li").unwrap();
                let items: Vec<BookInfo> = document
                    .select(&row)
                    .map(Self::latest_from_element)
                    .collect();
                // The latest listing paginates for as long as the list block
                // is present on the page.
                let marker = Selector::parse("div.ul-list1").unwrap();
                let has_next_page = document.select(&marker).next().is_some();
                Ok(PagedResult::new(items, has_next_page))
            }
        }
    }

    fn details_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_details(&self, body: &str) -> Result<BookInfo> {
        let document = Html::parse_document(body);

        let title = select_text(&document, "div.m-desc h1.tit");
        if title.is_empty() {
            return Err(Error::parse(
                self.meta.id,
                "details",
                "missing div.m-desc h1.tit",
            ));
        }

        let cover = select_attr_doc(&document, "div.m-book1 div.pic img", "src");
        let key = format!(
            "{}{}",
            BASE_URL,
            select_attr_doc(&document, "div.cur div.wp a:nth-child(5)", "href")
        );
        let author = select_attr_doc(&document, "div.right a.a1", "title");

        let paragraph = Selector::parse("div.inner p").unwrap();
        let description = document
            .select(&paragraph)
            .map(|p| text_of(p))
            .collect::<Vec<_>>()
            .join("\n");

        let genres = label_sibling_text(&document, "Genre")
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        let status_label = label_sibling_text(&document, "Status").replace(['\t', '\n'], "");

        Ok(BookInfo {
            key,
            title,
            cover: non_empty(cover),
            author: non_empty(author),
            artist: None,
            description: non_empty(description),
            genres,
            status: Status::from_label(&status_label),
        })
    }

    fn chapters_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn scan_chapter_pages(&self, body: &str) -> Result<ChapterPlan> {
        let document = Html::parse_document(body);
        let option = Selector::parse("#indexselect option").unwrap();
        let pages = document.select(&option).count() as u32;
        Ok(ChapterPlan {
            chapters: Self::chapters_from(&document),
            remaining_pages: pages.saturating_sub(1),
            cursor: None,
        })
    }

    fn chapter_page_request(&self, key: &str, _cursor: Option<&str>, page: u32) -> PageRequest {
        // The book page is index page 1; further index pages live at
        // <key without .html>/<n>.html starting from 2.
        let base = key.trim_end_matches(".html");
        self.request(format!("{}/{}.html", base, page + 1))
    }

    fn parse_chapter_page(&self, body: &str) -> Result<Vec<ChapterInfo>> {
        Ok(Self::chapters_from(&Html::parse_document(body)))
    }

    fn content_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_content(&self, body: &str) -> Result<PageContent> {
        let document = Html::parse_document(body);
        let block = Selector::parse("div.txt h4, div.txt p").unwrap();
        let blocks: Vec<String> = document
            .select(&block)
            .map(|e| text_of(e))
            .filter(|t| !t.is_empty())
            .collect();
        if blocks.is_empty() {
            return Err(Error::parse(
                self.meta.id,
                "content",
                "no text blocks under div.txt",
            ));
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

fn select_attr(element: ElementRef, selector: &str, attr: &str) -> String {
    let selector = Selector::parse(selector).unwrap();
    element
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .unwrap_or("")
        .to_string()
}

fn select_attr_doc(document: &Html, selector: &str, attr: &str) -> String {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .unwrap_or("")
        .to_string()
}

fn select_text(document: &Html, selector: &str) -> String {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .map(text_of)
        .unwrap_or_default()
}

/// Text of the element following a `[title=<label>]` node, the site's
/// label/value layout for genre and status rows.
fn label_sibling_text(document: &Html, label: &str) -> String {
    let selector = Selector::parse(&format!(r#"[title="{}"]"#, label)).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|e| e.next_siblings().filter_map(ElementRef::wrap).next())
        .map(text_of)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATEST_PAGE: &str = r#"
        <html><body>
        <div class="ul-list1">
          <div class="li">
            <div class="pic"><img src="/files/cover1.jpg"></div>
            <div class="txt"><a href="/novel/martial-peak.html" title="Martial Peak">Martial Peak</a></div>
          </div>
          <div class="li">
            <div class="pic"><img src="/files/cover2.jpg"></div>
            <div class="txt"><a href="/novel/overgeared.html" title="Overgeared">Overgeared</a></div>
          </div>
        </div>
        </body></html>"#;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <div class="ul-list1">
          <div class="li-row">
            <div class="pic"><img src="/files/cover3.jpg"></div>
            <div class="txt"><a href="/novel/sword-god.html" title="Sword God">Sword God</a></div>
          </div>
        </div>
        </body></html>"#;

    const DETAIL_PAGE: &str = r#"
        <html><body>
        <div class="cur"><div class="wp">
          <a href="/">Home</a><a href="/genre">Genre</a><a href="/a">A</a><a href="/b">B</a>
          <a href="/novel/martial-peak.html">Martial Peak</a>
        </div></div>
        <div class="m-book1"><div class="pic"><img src="/files/cover1.jpg"></div></div>
        <div class="m-desc"><h1 class="tit">Martial Peak</h1></div>
        <div class="right"><a class="a1" title="Momo" href="/author/momo">Momo</a></div>
        <div class="inner"><p>First paragraph.</p><p>Second paragraph.</p></div>
        <div class="m-info">
          <span title="Genre">Genre</span><span>Action, Fantasy</span>
          <span title="Status">Status</span><span>OnGoing</span>
        </div>
        </body></html>"#;

    const CHAPTERS_PAGE: &str = r#"
        <html><body>
        <select id="indexselect">
          <option>1</option><option>2</option><option>3</option>
        </select>
        <div class="m-newest2"><ul class="ul-list5">
          <li><a href="/novel/martial-peak/chapter-1.html" title="Chapter 1">Chapter 1</a></li>
          <li><a href="https://freewebnovel.com/novel/martial-peak/chapter-2.html" title="Chapter 2">Chapter 2</a></li>
        </ul></div>
        </body></html>"#;

    const CONTENT_PAGE: &str = r#"
        <html><body><div class="txt">
          <h4>Chapter 1 - Beginning</h4>
          <p>Line one.</p>
          <p>Line two.</p>
          <p>   </p>
        </div></body></html>"#;

    fn source() -> FreeWebnovel {
        FreeWebnovel::new()
    }

    #[test]
    fn latest_listing_parses_rows_and_pagination_marker() {
        let result = source()
            .parse_book_list(&Strategy::Default, LATEST_PAGE)
            .unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].title, "Martial Peak");
        assert_eq!(
            result.items[0].key,
            "https://freewebnovel.com/novel/martial-peak.html"
        );
        assert_eq!(result.items[0].cover.as_deref(), Some("/files/cover1.jpg"));
        assert!(result.has_next_page);
    }

    #[test]
    fn latest_listing_without_list_block_has_no_next_page() {
        let result = source()
            .parse_book_list(&Strategy::Default, "<html><body></body></html>")
            .unwrap();
        assert!(result.items.is_empty());
        assert!(!result.has_next_page);
    }

    #[test]
    fn search_results_never_claim_a_next_page() {
        let strategy = Strategy::Search {
            query: "sword".to_string(),
        };
        let result = source().parse_book_list(&strategy, SEARCH_PAGE).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "Sword God");
        assert!(!result.has_next_page);
    }

    #[test]
    fn sort_indices_route_to_distinct_urls() {
        let src = source();
        let latest = src.book_list_request(&Strategy::Sort { index: 0 }, 2);
        assert_eq!(
            latest.url,
            "https://freewebnovel.com/latest-release-novel/2/"
        );
        let popular = src.book_list_request(&Strategy::Sort { index: 1 }, 2);
        assert_eq!(popular.url, "https://freewebnovel.com/most-popular-novel/");
    }

    #[test]
    fn out_of_range_sort_index_falls_back_to_latest() {
        let request = source().book_list_request(&Strategy::Sort { index: 9 }, 1);
        assert_eq!(
            request.url,
            "https://freewebnovel.com/latest-release-novel/1/"
        );
    }

    #[test]
    fn search_request_carries_the_query() {
        let request = source().book_list_request(
            &Strategy::Search {
                query: "sword".to_string(),
            },
            3,
        );
        assert_eq!(
            request.url,
            "https://freewebnovel.com/search/?searchkey=sword"
        );
    }

    #[test]
    fn adapter_headers_are_applied_to_every_request() {
        let request = source().book_list_request(&Strategy::Default, 1);
        assert_eq!(request.headers.get("User-Agent").unwrap(), USER_AGENT);
        assert_eq!(request.headers.get("Referer").unwrap(), BASE_URL);
    }

    #[test]
    fn detail_page_parses_all_fields() {
        let book = source().parse_details(DETAIL_PAGE).unwrap();
        assert_eq!(book.title, "Martial Peak");
        assert_eq!(
            book.key,
            "https://freewebnovel.com/novel/martial-peak.html"
        );
        assert_eq!(book.cover.as_deref(), Some("/files/cover1.jpg"));
        assert_eq!(book.author.as_deref(), Some("Momo"));
        assert_eq!(
            book.description.as_deref(),
            Some("First paragraph.\nSecond paragraph.")
        );
        assert_eq!(book.genres, vec!["Action", "Fantasy"]);
        assert_eq!(book.status, Status::Ongoing);
    }

    #[test]
    fn detail_page_without_title_is_a_parse_error() {
        let err = source()
            .parse_details("<html><body></body></html>")
            .unwrap_err();
        assert!(err.to_string().contains("details"));
    }

    #[test]
    fn chapter_scan_discovers_page_count_and_first_page() {
        let plan = source().scan_chapter_pages(CHAPTERS_PAGE).unwrap();
        assert_eq!(plan.remaining_pages, 2);
        assert_eq!(plan.chapters.len(), 2);
        assert_eq!(plan.chapters[0].name, "Chapter 1");
        // Absolute and relative hrefs both normalize to absolute keys.
        assert_eq!(
            plan.chapters[0].key,
            "https://freewebnovel.com/novel/martial-peak/chapter-1.html"
        );
        assert_eq!(
            plan.chapters[1].key,
            "https://freewebnovel.com/novel/martial-peak/chapter-2.html"
        );
    }

    #[test]
    fn page_without_index_select_is_single_page() {
        let page = r#"<html><body>
            <div class="m-newest2"><ul class="ul-list5">
              <li><a href="/novel/x/chapter-1.html" title="Chapter 1">Chapter 1</a></li>
            </ul></div></body></html>"#;
        let plan = source().scan_chapter_pages(page).unwrap();
        assert_eq!(plan.remaining_pages, 0);
        assert_eq!(plan.chapters.len(), 1);
    }

    #[test]
    fn chapter_page_urls_rewrite_the_book_key() {
        let request = source().chapter_page_request(
            "https://freewebnovel.com/novel/martial-peak.html",
            None,
            1,
        );
        assert_eq!(
            request.url,
            "https://freewebnovel.com/novel/martial-peak/2.html"
        );
    }

    #[test]
    fn content_blocks_keep_heading_first_and_drop_blanks() {
        let content = source().parse_content(CONTENT_PAGE).unwrap();
        assert_eq!(
            content.blocks,
            vec!["Chapter 1 - Beginning", "Line one.", "Line two."]
        );
    }

    #[test]
    fn empty_content_is_a_parse_error() {
        assert!(source().parse_content("<html></html>").is_err());
    }

    #[test]
    fn declares_a_deep_link_for_its_host() {
        let links = source().deep_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].host, "freewebnovel.com");
        assert!(links[0].path.is_empty());
    }

    #[test]
    fn application_id_derives_from_the_name() {
        assert_eq!(source().application_id(), "ireader.freewebnovel");
    }
}
