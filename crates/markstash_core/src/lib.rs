//! Core domain logic for markstash, a personal bookmark store.
//! This crate is the single source of truth for store invariants: unique urls,
//! dense ids, canonical tag strings and keyword search semantics.

pub mod db;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use fetch::{extract_title, HttpTitleFetcher, TitleFetcher};
pub use logging::{init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::bookmark::{Bookmark, BookmarkId, NewBookmark, Target, TitleInput};
pub use model::tags::{canonicalize_tags, EMPTY_TAGS};
pub use repo::bookmark_repo::{BookmarkRepository, RepoError, RepoResult, SqliteBookmarkRepository};
pub use search::keyword::{
    list_blank, list_tags, search_keywords, search_regex, search_tags, tag_counts,
    ReservedKeyword, SearchError, SearchHit, SearchMode, SearchQuery, SearchResult, TagCount,
};
pub use service::bookmark_service::{id_from_index, target_from_index, BookmarkService, RefreshReport};
pub use service::tag_service::{TagRewriteOutcome, TagRewriter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
