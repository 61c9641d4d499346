//! Substring search over url, title and tags.
//!
//! # Responsibility
//! - Build and evaluate ANY/ALL keyword queries with SQL `LIKE`.
//! - Provide tag-bounded and regex variants plus the `tags`/`blank` listings.
//!
//! # Invariants
//! - Matching is case-insensitive (SQLite `LIKE`, ASCII folding).
//! - Tags are matched against the raw canonical string, delimiters included.
//! - Results are always in ascending id order and ranked from 1.

use crate::db::DbError;
use crate::model::bookmark::Bookmark;
use crate::model::tags::{split_tags, tag_needle, EMPTY_TAGS};
use crate::repo::bookmark_repo::{parse_bookmark_row, RepoError};
use regex::RegexBuilder;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for pattern parsing, DB interaction and row decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided regex cannot be compiled.
    InvalidPattern { pattern: String, message: String },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid search pattern `{pattern}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidPattern { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::StorageUnavailable(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// How per-keyword matches are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// A bookmark matching at least one keyword is a hit.
    #[default]
    Any,
    /// A bookmark must match every keyword, each possibly in a different field.
    All,
}

impl SearchMode {
    fn sql_joiner(self) -> &'static str {
        match self {
            Self::Any => " OR ",
            Self::All => " AND ",
        }
    }
}

/// Keyword query options.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub mode: SearchMode,
}

impl SearchQuery {
    pub fn new<I, S>(keywords: I, mode: SearchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Detects the reserved single-keyword forms that bypass search.
    pub fn reserved(&self) -> Option<ReservedKeyword> {
        match self.keywords.as_slice() {
            [single] if single == "tags" => Some(ReservedKeyword::Tags),
            [single] if single == "blank" => Some(ReservedKeyword::Blank),
            _ => None,
        }
    }
}

/// Single-keyword forms the caller answers with a listing instead of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedKeyword {
    /// List distinct tags, see [`list_tags`].
    Tags,
    /// List untitled or untagged bookmarks, see [`list_blank`].
    Blank,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// 1-based position used for "open result N"; unrelated to the id.
    pub rank: usize,
    pub bookmark: Bookmark,
}

/// Distinct tag with the number of bookmarks carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Searches bookmarks whose url, title or tags contain the keywords.
///
/// Empty keywords are ignored; a query without keywords returns no hits.
///
/// Case folding is ASCII-only (SQLite `LIKE`): `uber` matches `UBER` but not
/// `ÜBER`. [`search_regex`] folds full Unicode, so the two can disagree on
/// non-ASCII text.
pub fn search_keywords(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let keywords = query
        .keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>();
    if keywords.is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::with_capacity(keywords.len());
    let mut bind_values: Vec<Value> = Vec::with_capacity(keywords.len() * 3);
    for keyword in keywords {
        clauses.push(
            r"(url LIKE ? ESCAPE '\' OR title LIKE ? ESCAPE '\' OR tags LIKE ? ESCAPE '\')",
        );
        let pattern = like_pattern(keyword);
        for _ in 0..3 {
            bind_values.push(Value::Text(pattern.clone()));
        }
    }

    let where_clause = clauses.join(query.mode.sql_joiner());
    select_ranked(conn, &where_clause, bind_values)
}

/// Searches bookmarks carrying whole tags, combined with `mode`.
///
/// Each tag is matched as a delimiter-bounded needle (`,tag,`).
pub fn search_tags<S: AsRef<str>>(
    conn: &Connection,
    tags: &[S],
    mode: SearchMode,
) -> SearchResult<Vec<SearchHit>> {
    let needles = tags
        .iter()
        .filter_map(|tag| tag_needle(tag.as_ref()))
        .collect::<Vec<_>>();
    if needles.is_empty() {
        return Ok(Vec::new());
    }

    let clauses = vec![r"tags LIKE ? ESCAPE '\'"; needles.len()];
    let bind_values = needles
        .iter()
        .map(|needle| Value::Text(like_pattern(needle)))
        .collect::<Vec<_>>();

    select_ranked(conn, &clauses.join(mode.sql_joiner()), bind_values)
}

/// Searches url, title and tags with a case-insensitive regular expression.
pub fn search_regex(conn: &Connection, pattern: &str) -> SearchResult<Vec<SearchHit>> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| SearchError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;

    let hits = load_all(conn)?
        .into_iter()
        .filter(|bookmark| {
            regex.is_match(&bookmark.url)
                || regex.is_match(&bookmark.title)
                || regex.is_match(&bookmark.tags)
        })
        .collect::<Vec<_>>();
    Ok(rank(hits))
}

/// Lists distinct tags sorted case-insensitively.
pub fn list_tags(conn: &Connection) -> SearchResult<Vec<String>> {
    Ok(tag_counts(conn)?.into_iter().map(|entry| entry.tag).collect())
}

/// Lists distinct tags with usage counts, sorted case-insensitively.
pub fn tag_counts(conn: &Connection) -> SearchResult<Vec<TagCount>> {
    let mut stmt = conn.prepare("SELECT tags FROM bookmarks WHERE tags <> ?1;")?;
    let mut rows = stmt.query([EMPTY_TAGS])?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let tags: String = row.get(0)?;
        for tag in split_tags(&tags).collect::<BTreeSet<_>>() {
            *counts.entry(tag.to_string()).or_default() += 1;
        }
    }

    let mut entries = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect::<Vec<_>>();
    entries.sort_by_cached_key(|entry| entry.tag.to_lowercase());
    Ok(entries)
}

/// Lists bookmarks with an empty title or no tags, in id order.
pub fn list_blank(conn: &Connection) -> SearchResult<Vec<Bookmark>> {
    let mut stmt = conn.prepare(
        "SELECT id, url, title, tags
         FROM bookmarks
         WHERE title = '' OR tags = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([EMPTY_TAGS])?;
    let mut bookmarks = Vec::new();
    while let Some(row) = rows.next()? {
        bookmarks.push(parse_bookmark_row(row)?);
    }
    Ok(bookmarks)
}

fn select_ranked(
    conn: &Connection,
    where_clause: &str,
    bind_values: Vec<Value>,
) -> SearchResult<Vec<SearchHit>> {
    let sql = format!(
        "SELECT id, url, title, tags FROM bookmarks WHERE {where_clause} ORDER BY id ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut bookmarks = Vec::new();
    while let Some(row) = rows.next()? {
        bookmarks.push(parse_bookmark_row(row)?);
    }

    Ok(rank(bookmarks))
}

fn load_all(conn: &Connection) -> SearchResult<Vec<Bookmark>> {
    let mut stmt = conn.prepare("SELECT id, url, title, tags FROM bookmarks ORDER BY id ASC;")?;
    let mut rows = stmt.query([])?;
    let mut bookmarks = Vec::new();
    while let Some(row) = rows.next()? {
        bookmarks.push(parse_bookmark_row(row)?);
    }
    Ok(bookmarks)
}

fn rank(bookmarks: Vec<Bookmark>) -> Vec<SearchHit> {
    bookmarks
        .into_iter()
        .enumerate()
        .map(|(idx, bookmark)| SearchHit {
            rank: idx + 1,
            bookmark,
        })
        .collect()
}

fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, SearchMode, SearchQuery};
    use crate::search::keyword::ReservedKeyword;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn reserved_keywords_only_apply_alone() {
        assert_eq!(
            SearchQuery::new(["tags"], SearchMode::Any).reserved(),
            Some(ReservedKeyword::Tags)
        );
        assert_eq!(
            SearchQuery::new(["blank"], SearchMode::All).reserved(),
            Some(ReservedKeyword::Blank)
        );
        assert_eq!(
            SearchQuery::new(["tags", "rust"], SearchMode::Any).reserved(),
            None
        );
    }
}
