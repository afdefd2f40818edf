// Library interface for rust_novel_scraper
// Exposes the extraction engine, the source contract, and the bundled sources.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod http;
pub mod models;
pub mod registry;
pub mod source;
pub mod sources;

pub use engine::{resolve_strategy, Engine};
pub use error::{Error, Result, TransportError};
pub use filter::{Filter, FilterList, Listing};
pub use models::{
    BookInfo, ChapterInfo, DeepLink, PageContent, PagedResult, SourceMeta, Status,
};
pub use registry::SourceRegistry;
pub use source::{ChapterPlan, Source, Strategy};
