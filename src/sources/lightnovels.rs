use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterList, Listing};
use crate::http::PageRequest;
use crate::models::{
    BookInfo, ChapterInfo, PageContent, PagedResult, SourceMeta, Status,
};
use crate::source::{ChapterPlan, Source, Strategy};

const BASE_URL: &str = "https://lightnovels.me";
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36";

/// Chapters per page of the chapter API.
const CHAPTER_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
struct BookListDto {
    results: Vec<BookHit>,
    index: i64,
    total: i64,
}

#[derive(Debug, Deserialize)]
struct BookHit {
    novel_name: String,
    #[serde(default)]
    novel_slug: String,
    #[serde(default)]
    novel_image: String,
    #[serde(default)]
    status: Option<String>,
}

/// The search endpoint answers with one of two shapes depending on server
/// version; untagged decoding tries them in this declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    Flat { results: Vec<BookHit> },
    Nested { results: NestedHits },
}

#[derive(Debug, Deserialize)]
struct NestedHits {
    data: Vec<BookHit>,
}

impl SearchPayload {
    fn hits(self) -> Vec<BookHit> {
        match self {
            SearchPayload::Flat { results } => results,
            SearchPayload::Nested { results } => results.data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NovelDetail {
    props: DetailProps,
}

#[derive(Debug, Deserialize)]
struct DetailProps {
    #[serde(rename = "pageProps")]
    page_props: DetailPageProps,
}

#[derive(Debug, Deserialize)]
struct DetailPageProps {
    #[serde(rename = "novelInfo")]
    novel_info: NovelInfo,
    #[serde(default)]
    genres: Vec<Named>,
    #[serde(default)]
    authors: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct NovelInfo {
    novel_id: i64,
    novel_name: String,
    #[serde(default)]
    novel_image: String,
    #[serde(default)]
    novel_description: String,
    #[serde(default)]
    novel_status: String,
    #[serde(default)]
    num_chapters: i64,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChapterListDto {
    results: Vec<ChapterHit>,
}

#[derive(Debug, Deserialize)]
struct ChapterHit {
    chapter_name: String,
    slug: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct ContentData {
    props: ContentProps,
}

#[derive(Debug, Deserialize)]
struct ContentProps {
    #[serde(rename = "pageProps")]
    page_props: ContentPageProps,
}

#[derive(Debug, Deserialize)]
struct ContentPageProps {
    #[serde(rename = "cachedChapterInfo")]
    cached_chapter_info: CachedChapter,
}

#[derive(Debug, Deserialize)]
struct CachedChapter {
    chapter_name: String,
    content: String,
}

/// LightNovel.me - Next.js app; listings and chapters come from its JSON
/// API, details and content from the `__NEXT_DATA__` page blob.
pub struct LightNovels {
    meta: SourceMeta,
}

impl LightNovels {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                id: 9999999997,
                name: "LightNovel.me",
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

    fn parse_err(&self, operation: &'static str, err: impl std::fmt::Display) -> Error {
        Error::parse(self.meta.id, operation, err.to_string())
    }

    fn book_from_hit(&self, hit: BookHit) -> BookInfo {
        BookInfo {
            key: format!("{}/novel{}", BASE_URL, hit.novel_slug),
            title: hit.novel_name,
            cover: if hit.novel_image.is_empty() {
                None
            } else {
                Some(format!("{}{}", BASE_URL, hit.novel_image))
            },
            status: hit
                .status
                .as_deref()
                .map(Status::from_label)
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl Default for LightNovels {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for LightNovels {
    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn listings(&self) -> Vec<Listing> {
        vec![Listing::new("Latest")]
    }

    fn filters(&self) -> FilterList {
        FilterList::new(vec![
            Filter::title(),
            Filter::sort(
                "Sort By:",
                &["Latest Release", "Hot Novel", "Complete Novel"],
            ),
        ])
    }

    fn application_id(&self) -> String {
        "ireader.lightnovels".to_string()
    }

    fn book_list_request(&self, strategy: &Strategy, page: u32) -> PageRequest {
        let index = page.saturating_sub(1) * 20;
        match strategy {
            Strategy::Search { query } => self.request(format!(
                "{}/api/search?keyword={}&index=0&limit=200",
                BASE_URL, query
            )),
            Strategy::Sort { index: 1 } => self.request(format!(
                "{}/api/novel/hot-novel?index={}&limit=20",
                BASE_URL, index
            )),
            Strategy::Sort { index: 2 } => self.request(format!(
                "{}/api/novel/completed-novels?index={}&limit=20",
                BASE_URL, index
            )),
            // Unmapped sort indices and every listing route to the latest feed.
            _ => self.request(format!(
                "{}/api/novel/latest-release-novel?index={}&limit=20",
                BASE_URL, index
            )),
        }
    }

    fn parse_book_list(&self, strategy: &Strategy, body: &str) -> Result<PagedResult<BookInfo>> {
        match strategy {
            Strategy::Search { .. } => {
                let payload: SearchPayload =
                    serde_json::from_str(body).map_err(|e| self.parse_err("book_list", e))?;
                let items = payload
                    .hits()
                    .into_iter()
                    .map(|hit| self.book_from_hit(hit))
                    .collect();
                Ok(PagedResult::new(items, false))
            }
            _ => {
                let payload: BookListDto =
                    serde_json::from_str(body).map_err(|e| self.parse_err("book_list", e))?;
                let has_next_page = payload.index < payload.total;
                let items = payload
                    .results
                    .into_iter()
                    .map(|hit| self.book_from_hit(hit))
                    .collect();
                Ok(PagedResult::new(items, has_next_page))
            }
        }
    }

    fn details_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_details(&self, body: &str) -> Result<BookInfo> {
        let detail = extract_next_data::<NovelDetail>(body)
            .map_err(|reason| Error::parse(self.meta.id, "details", reason))?;
        let props = detail.props.page_props;
        let info = props.novel_info;

        Ok(BookInfo {
            // The caller keeps its own key; the payload has no canonical URL.
            key: String::new(),
            title: info.novel_name,
            cover: if info.novel_image.is_empty() {
                None
            } else {
                Some(format!("{}{}", BASE_URL, info.novel_image))
            },
            author: props.authors.into_iter().next().map(|a| a.name),
            artist: None,
            description: if info.novel_description.is_empty() {
                None
            } else {
                Some(info.novel_description)
            },
            genres: props.genres.into_iter().map(|g| g.name).collect(),
            status: Status::from_label(&info.novel_status),
        })
    }

    fn chapters_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn scan_chapter_pages(&self, body: &str) -> Result<ChapterPlan> {
        let detail = extract_next_data::<NovelDetail>(body)
            .map_err(|reason| Error::parse(self.meta.id, "chapter_list", reason))?;
        let info = detail.props.page_props.novel_info;
        let total = info.num_chapters.max(0);
        let pages = (total + CHAPTER_PAGE_SIZE - 1) / CHAPTER_PAGE_SIZE;

        // The novel page itself lists no chapters; every page comes from
        // the chapter API, keyed by the numeric novel id.
        Ok(ChapterPlan {
            chapters: Vec::new(),
            remaining_pages: pages as u32,
            cursor: Some(info.novel_id.to_string()),
        })
    }

    fn chapter_page_request(&self, _key: &str, cursor: Option<&str>, page: u32) -> PageRequest {
        let novel_id = cursor.unwrap_or_default();
        let index = (page as i64 - 1) * CHAPTER_PAGE_SIZE;
        self.request(format!(
            "{}/api/chapters?id={}&index={}&limit={}",
            BASE_URL, novel_id, index, CHAPTER_PAGE_SIZE
        ))
    }

    fn parse_chapter_page(&self, body: &str) -> Result<Vec<ChapterInfo>> {
        let payload: ChapterListDto =
            serde_json::from_str(body).map_err(|e| self.parse_err("chapter_page", e))?;
        Ok(payload
            .results
            .into_iter()
            .map(|hit| ChapterInfo {
                key: format!("{}{}", BASE_URL, hit.slug),
                name: hit.chapter_name,
                date_upload: parse_chapter_date(&hit.updated_at),
            })
            .collect())
    }

    fn content_request(&self, key: &str) -> PageRequest {
        self.request(key.to_string())
    }

    fn parse_content(&self, body: &str) -> Result<PageContent> {
        let data = extract_next_data::<ContentData>(body)
            .map_err(|reason| Error::parse(self.meta.id, "content", reason))?;
        let chapter = data.props.page_props.cached_chapter_info;

        let mut blocks = vec![chapter.chapter_name];
        blocks.extend(split_paragraphs(&chapter.content));
        Ok(PageContent::new(blocks))
    }
}

/// Extract and decode the `__NEXT_DATA__` JSON blob from a Next.js page.
fn extract_next_data<T: serde::de::DeserializeOwned>(
    html: &str,
) -> std::result::Result<T, String> {
    let re =
        Regex::new(r#"(?s)<script id="__NEXT_DATA__" type="application/json">(.+?)</script>"#)
            .unwrap();
    let json = re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| "could not find __NEXT_DATA__ in page".to_string())?
        .as_str();
    serde_json::from_str(json).map_err(|e| e.to_string())
}

fn parse_chapter_date(date: &str) -> Option<i64> {
    // Timestamps arrive as "yyyy-mm-dd" or with a time suffix; only the
    // date part is meaningful.
    let date = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Split the API's chapter HTML into plain text paragraphs. Deterministic
/// and idempotent for identical input.
fn split_paragraphs(content: &str) -> Vec<String> {
    const MARKERS: &[&str] = &["</p><p></p><p>", "<p>", "<br>"];

    let mut parts = vec![content.to_string()];
    for marker in MARKERS {
        parts = parts
            .iter()
            .flat_map(|part| part.split(marker).map(str::to_string))
            .collect();
    }

    parts
        .into_iter()
        .map(|part| {
            let fragment = Html::parse_fragment(&part);
            fragment
                .root_element()
                .text()
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|part| !part.is_empty())
        .collect()
}
