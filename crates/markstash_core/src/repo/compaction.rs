//! Index compaction after a single-row delete.
//!
//! # Invariants
//! - Runs inside the delete transaction, so a cancelled process never observes
//!   a gap between the removed row and the moved one.
//! - At most one row moves per delete (swap with last).
//! - Only the moved row changes id; every other row keeps its id and content.

use crate::model::bookmark::{Bookmark, BookmarkId};
use crate::repo::bookmark_repo::{parse_bookmark_row, RepoResult};
use log::debug;
use rusqlite::{params, OptionalExtension, Transaction};

/// Moves the highest-id row into `deleted` when it sits above the gap.
///
/// Returns the id the row moved from, or `None` when the deleted row was
/// already the last one or the store is now empty.
pub(crate) fn compact_after_delete(
    tx: &Transaction<'_>,
    deleted: BookmarkId,
) -> RepoResult<Option<BookmarkId>> {
    let last = tx
        .query_row(
            "SELECT id, url, title, tags FROM bookmarks ORDER BY id DESC LIMIT 1;",
            [],
            |row| Ok(parse_bookmark_row(row)),
        )
        .optional()?
        .transpose()?;

    let Some(Bookmark {
        id: last_id,
        url,
        title,
        tags,
    }) = last
    else {
        return Ok(None);
    };

    if last_id <= deleted {
        return Ok(None);
    }

    tx.execute("DELETE FROM bookmarks WHERE id = ?1;", [last_id])?;
    tx.execute(
        "INSERT INTO bookmarks (id, url, title, tags) VALUES (?1, ?2, ?3, ?4);",
        params![deleted, url, title, tags],
    )?;
    debug!("event=compact module=repo status=ok from={last_id} to={deleted}");

    Ok(Some(last_id))
}
