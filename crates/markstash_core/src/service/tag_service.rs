//! Bulk tag rename/delete across all bookmarks.
//!
//! # Invariants
//! - Only whole tags match; `work` never touches `homework`.
//! - Renaming onto a tag the bookmark already carries drops the old tag
//!   instead of storing a duplicate.
//! - All affected rows are written in one transaction.

use crate::model::tags::{canonical_content, canonicalize_tags, rewrite_tags, tag_needle, EMPTY_TAGS};
use crate::repo::bookmark_repo::{BookmarkRepository, RepoError, RepoResult};
use log::info;

/// Result of a tag rewrite request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRewriteOutcome {
    /// Old and new tags canonicalize identically; nothing was read or written.
    Unchanged,
    /// Number of bookmarks whose tags changed (possibly zero).
    Rewritten { affected: usize },
}

/// Tag rewriter borrowing a repository.
pub struct TagRewriter<'repo, R: BookmarkRepository> {
    repo: &'repo mut R,
}

impl<'repo, R: BookmarkRepository> TagRewriter<'repo, R> {
    pub fn new(repo: &'repo mut R) -> Self {
        Self { repo }
    }

    /// Replaces `old` with `new_tags` in every bookmark, or deletes it when
    /// `new_tags` is `None` or canonicalizes to nothing.
    pub fn replace_tag<S: AsRef<str>>(
        &mut self,
        old: &str,
        new_tags: Option<&[S]>,
    ) -> RepoResult<TagRewriteOutcome> {
        let needle = tag_needle(old).ok_or_else(|| RepoError::InvalidTag(old.to_string()))?;
        let replacement = new_tags
            .map(canonicalize_tags)
            .filter(|canonical| canonical != EMPTY_TAGS);

        if replacement.as_deref() == Some(needle.as_str()) {
            info!("event=tag_replace module=service status=skip reason=same_tags");
            return Ok(TagRewriteOutcome::Unchanged);
        }

        let old_tag = canonical_content(&needle);
        let updates = self
            .repo
            .list_containing_tags(old_tag)?
            .into_iter()
            .filter_map(|bookmark| {
                rewrite_tags(&bookmark.tags, old_tag, replacement.as_deref())
                    .filter(|rewritten| *rewritten != bookmark.tags)
                    .map(|rewritten| (bookmark.id, rewritten))
            })
            .collect::<Vec<_>>();

        let affected = self.repo.set_tags_bulk(&updates)?;
        info!(
            "event=tag_replace module=service status=ok mode={} affected={affected}",
            if replacement.is_some() { "rename" } else { "delete" }
        );
        Ok(TagRewriteOutcome::Rewritten { affected })
    }

    /// Deletes `tag` from every bookmark carrying it.
    pub fn delete_tag(&mut self, tag: &str) -> RepoResult<TagRewriteOutcome> {
        self.replace_tag::<&str>(tag, None)
    }
}
