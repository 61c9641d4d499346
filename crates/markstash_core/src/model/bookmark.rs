//! Bookmark record and call-level selectors.
//!
//! # Invariants
//! - `url` is non-empty and unique across the store.
//! - `title` is never null; an empty string means "no title".
//! - `tags` is always in canonical form (see [`crate::model::tags`]).

use crate::model::tags::EMPTY_TAGS;
use serde::{Deserialize, Serialize};

/// Dense positional identifier of a bookmark.
///
/// Ids are not stable across deletes: compaction may move the last record into a
/// vacated slot.
pub type BookmarkId = u32;

/// One stored bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub url: String,
    pub title: String,
    /// Canonical comma-wrapped tag string, `,` when untagged.
    pub tags: String,
}

impl Bookmark {
    /// Returns whether this bookmark shows up in the `blank` listing.
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() || self.tags == EMPTY_TAGS
    }
}

/// Field content for a bookmark write, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub url: String,
    /// Raw tag tokens, canonicalized by the service before persistence.
    pub tags: Vec<String>,
    pub title: TitleInput,
}

impl NewBookmark {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tags: Vec::new(),
            title: TitleInput::Fetch,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title(mut self, title: TitleInput) -> Self {
        self.title = title;
        self
    }
}

/// How the title of a written bookmark is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TitleInput {
    /// Use the given string verbatim, including the empty string.
    Manual(String),
    /// Ask the title fetcher; an empty result is stored as an empty title.
    #[default]
    Fetch,
}

impl TitleInput {
    pub fn manual(title: impl Into<String>) -> Self {
        Self::Manual(title.into())
    }
}

/// Selects one bookmark or the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    One(BookmarkId),
}

impl Target {
    /// Maps a user-facing index to a target; `0` is the "all records" sentinel.
    ///
    /// Returns `None` for negative values or values that overflow an id.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::All),
            value if value > 0 => BookmarkId::try_from(value).ok().map(Self::One),
            _ => None,
        }
    }
}
