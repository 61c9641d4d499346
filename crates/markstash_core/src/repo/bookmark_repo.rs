//! Bookmark repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level persistence APIs over the `bookmarks` table.
//! - Enforce url/id uniqueness before writing and map constraint violations
//!   to semantic errors.
//! - Keep ids dense by compacting inside the delete transaction.
//!
//! # Invariants
//! - Every write method commits before returning.
//! - Stored tag strings are already canonical; this layer never rewrites them.
//! - Reads return rows in ascending id order.

use crate::db::DbError;
use crate::model::bookmark::{Bookmark, BookmarkId};
use crate::repo::compaction::compact_after_delete;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOOKMARK_SELECT_SQL: &str = "SELECT id, url, title, tags FROM bookmarks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for bookmark persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Another bookmark already stores this url.
    DuplicateUrl(String),
    /// The requested id is already taken.
    IndexOccupied(BookmarkId),
    NotFound(BookmarkId),
    /// A positive id was required.
    InvalidIndex(i64),
    /// A tag argument canonicalized to nothing.
    InvalidTag(String),
    /// The url argument is empty.
    EmptyUrl,
    /// The underlying store cannot be opened, read or written.
    StorageUnavailable(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateUrl(url) => write!(f, "url already exists: {url}"),
            Self::IndexOccupied(id) => write!(f, "index already occupied: {id}"),
            Self::NotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::InvalidIndex(index) => write!(f, "invalid index: {index}"),
            Self::InvalidTag(tag) => write!(f, "invalid tag: `{tag}`"),
            Self::EmptyUrl => write!(f, "url cannot be empty"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted bookmark data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(DbError::Sqlite(value))
    }
}

/// Row-level persistence contract for bookmarks.
///
/// Title resolution and tag canonicalization happen above this layer, in
/// [`crate::service::bookmark_service::BookmarkService`].
pub trait BookmarkRepository {
    /// Inserts one row. `id = None` assigns `max(id) + 1`, failing with
    /// `InvalidIndex` once the id space is exhausted.
    fn insert_bookmark(
        &mut self,
        id: Option<BookmarkId>,
        url: &str,
        title: &str,
        tags: &str,
    ) -> RepoResult<BookmarkId>;
    /// Replaces url/title/tags of an existing row.
    fn update_bookmark(
        &mut self,
        id: BookmarkId,
        url: &str,
        title: &str,
        tags: &str,
    ) -> RepoResult<()>;
    /// Replaces only the title of an existing row.
    fn set_title(&mut self, id: BookmarkId, title: &str) -> RepoResult<()>;
    /// Replaces tags for many rows in one transaction and returns rows changed.
    fn set_tags_bulk(&mut self, updates: &[(BookmarkId, String)]) -> RepoResult<usize>;
    /// Deletes one row and compacts ids. Returns the id that moved into the
    /// vacated slot, if any.
    fn delete_bookmark(&mut self, id: BookmarkId) -> RepoResult<Option<BookmarkId>>;
    /// Deletes every row and returns how many were removed.
    fn delete_all(&mut self) -> RepoResult<usize>;
    fn get_bookmark(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>>;
    fn list_bookmarks(&self) -> RepoResult<Vec<Bookmark>>;
    /// Lists rows whose tag string contains `needle` (case-sensitive).
    fn list_containing_tags(&self, needle: &str) -> RepoResult<Vec<Bookmark>>;
    fn find_id_by_url(&self, url: &str) -> RepoResult<Option<BookmarkId>>;
    fn max_id(&self) -> RepoResult<Option<BookmarkId>>;
    fn count(&self) -> RepoResult<u32>;
}

/// SQLite-backed bookmark repository.
pub struct SqliteBookmarkRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBookmarkRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_bookmarks_table(conn)?;
        Ok(Self { conn })
    }

    /// Read-only access for query modules sharing the same connection.
    pub fn connection(&self) -> &Connection {
        &*self.conn
    }
}

impl BookmarkRepository for SqliteBookmarkRepository<'_> {
    fn insert_bookmark(
        &mut self,
        id: Option<BookmarkId>,
        url: &str,
        title: &str,
        tags: &str,
    ) -> RepoResult<BookmarkId> {
        if url.is_empty() {
            return Err(RepoError::EmptyUrl);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if url_owner_in_tx(&tx, url)?.is_some() {
            return Err(RepoError::DuplicateUrl(url.to_string()));
        }

        let id = match id {
            Some(0) => return Err(RepoError::InvalidIndex(0)),
            Some(requested) => {
                if id_exists_in_tx(&tx, requested)? {
                    return Err(RepoError::IndexOccupied(requested));
                }
                requested
            }
            None => match max_id_in_tx(&tx)? {
                None => 1,
                Some(max) => max
                    .checked_add(1)
                    .ok_or(RepoError::InvalidIndex(i64::from(max) + 1))?,
            },
        };

        tx.execute(
            "INSERT INTO bookmarks (id, url, title, tags) VALUES (?1, ?2, ?3, ?4);",
            params![id, url, title, tags],
        )
        .map_err(|err| map_write_error(err, id, url))?;
        tx.commit()?;

        Ok(id)
    }

    fn update_bookmark(
        &mut self,
        id: BookmarkId,
        url: &str,
        title: &str,
        tags: &str,
    ) -> RepoResult<()> {
        if url.is_empty() {
            return Err(RepoError::EmptyUrl);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !id_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }
        if let Some(owner) = url_owner_in_tx(&tx, url)? {
            if owner != id {
                return Err(RepoError::DuplicateUrl(url.to_string()));
            }
        }

        tx.execute(
            "UPDATE bookmarks SET url = ?2, title = ?3, tags = ?4 WHERE id = ?1;",
            params![id, url, title, tags],
        )
        .map_err(|err| map_write_error(err, id, url))?;
        tx.commit()?;

        Ok(())
    }

    fn set_title(&mut self, id: BookmarkId, title: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE bookmarks SET title = ?2 WHERE id = ?1;",
            params![id, title],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn set_tags_bulk(&mut self, updates: &[(BookmarkId, String)]) -> RepoResult<usize> {
        if updates.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare("UPDATE bookmarks SET tags = ?2 WHERE id = ?1;")?;
            for (id, tags) in updates {
                changed += stmt.execute(params![id, tags.as_str()])?;
            }
        }
        tx.commit()?;

        Ok(changed)
    }

    fn delete_bookmark(&mut self, id: BookmarkId) -> RepoResult<Option<BookmarkId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM bookmarks WHERE id = ?1;", [id])?;
        if removed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let moved_from = compact_after_delete(&tx, id)?;
        tx.commit()?;

        Ok(moved_from)
    }

    fn delete_all(&mut self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM bookmarks;", [])?;
        Ok(removed)
    }

    fn get_bookmark(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKMARK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bookmark_row(row)?));
        }

        Ok(None)
    }

    fn list_bookmarks(&self) -> RepoResult<Vec<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKMARK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next()? {
            bookmarks.push(parse_bookmark_row(row)?);
        }

        Ok(bookmarks)
    }

    fn list_containing_tags(&self, needle: &str) -> RepoResult<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOOKMARK_SELECT_SQL} WHERE instr(tags, ?1) > 0 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([needle])?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next()? {
            bookmarks.push(parse_bookmark_row(row)?);
        }

        Ok(bookmarks)
    }

    fn find_id_by_url(&self, url: &str) -> RepoResult<Option<BookmarkId>> {
        let id = self
            .conn
            .query_row("SELECT id FROM bookmarks WHERE url = ?1;", [url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    fn max_id(&self) -> RepoResult<Option<BookmarkId>> {
        let max = self
            .conn
            .query_row("SELECT MAX(id) FROM bookmarks;", [], |row| row.get(0))?;
        Ok(max)
    }

    fn count(&self) -> RepoResult<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookmarks;", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Decodes one `bookmarks` row selected with [`BOOKMARK_SELECT_SQL`] columns.
pub(crate) fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let id: i64 = row.get("id")?;
    let id = BookmarkId::try_from(id)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid id `{id}` in bookmarks.id")))?;

    let tags: String = row.get("tags")?;
    if !tags.starts_with(',') || !tags.ends_with(',') {
        return Err(RepoError::InvalidData(format!(
            "non-canonical tags `{tags}` in bookmarks.tags for id {id}"
        )));
    }

    Ok(Bookmark {
        id,
        url: row.get("url")?,
        title: row.get("title")?,
        tags,
    })
}

fn url_owner_in_tx(tx: &Transaction<'_>, url: &str) -> RepoResult<Option<BookmarkId>> {
    let owner = tx
        .query_row("SELECT id FROM bookmarks WHERE url = ?1;", [url], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(owner)
}

fn id_exists_in_tx(tx: &Transaction<'_>, id: BookmarkId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn max_id_in_tx(tx: &Transaction<'_>) -> RepoResult<Option<BookmarkId>> {
    let max = tx.query_row("SELECT MAX(id) FROM bookmarks;", [], |row| row.get(0))?;
    Ok(max)
}

/// Re-surfaces uniqueness violations that slipped past the pre-write checks.
fn map_write_error(err: rusqlite::Error, id: BookmarkId, url: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => return RepoError::IndexOccupied(id),
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return RepoError::DuplicateUrl(url.to_string())
            }
            _ => {}
        }
    }

    RepoError::StorageUnavailable(DbError::Sqlite(err))
}

fn ensure_bookmarks_table(conn: &Connection) -> RepoResult<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(bookmarks);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    for required in ["id", "url", "title", "tags"] {
        if !columns.iter().any(|column| column == required) {
            return Err(RepoError::InvalidData(format!(
                "bookmarks table is missing column `{required}`"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{map_write_error, RepoError};
    use crate::db::open_db_in_memory;

    #[test]
    fn constraint_failures_map_to_semantic_errors() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO bookmarks (id, url, title, tags) VALUES (1, 'https://a.example', '', ',');",
            [],
        )
        .unwrap();

        let same_url = conn
            .execute(
                "INSERT INTO bookmarks (id, url, title, tags) VALUES (2, 'https://a.example', '', ',');",
                [],
            )
            .unwrap_err();
        assert!(matches!(
            map_write_error(same_url, 2, "https://a.example"),
            RepoError::DuplicateUrl(url) if url == "https://a.example"
        ));

        let same_id = conn
            .execute(
                "INSERT INTO bookmarks (id, url, title, tags) VALUES (1, 'https://b.example', '', ',');",
                [],
            )
            .unwrap_err();
        assert!(matches!(
            map_write_error(same_id, 1, "https://b.example"),
            RepoError::IndexOccupied(1)
        ));
    }

    #[test]
    fn other_failures_stay_storage_errors() {
        let conn = open_db_in_memory().unwrap();
        let err = conn
            .execute("INSERT INTO missing_table (id) VALUES (1);", [])
            .unwrap_err();
        assert!(matches!(
            map_write_error(err, 1, "https://a.example"),
            RepoError::StorageUnavailable(_)
        ));
    }
}
