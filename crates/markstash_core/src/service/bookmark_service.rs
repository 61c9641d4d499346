//! Bookmark use-case service.
//!
//! # Responsibility
//! - Canonicalize tags and resolve titles before handing rows to the repository.
//! - Expose add/insert/update/refresh/delete/get with "all records" targets.
//!
//! # Invariants
//! - Duplicate-url checks run before any title fetch or row write.
//! - A fetched empty title never overwrites a stored title on refresh.
//! - Deleting every bookmark requires the caller's confirmation callback.

use crate::fetch::TitleFetcher;
use crate::model::bookmark::{Bookmark, BookmarkId, NewBookmark, Target, TitleInput};
use crate::model::tags::canonicalize_tags;
use crate::repo::bookmark_repo::{BookmarkRepository, RepoError, RepoResult};
use crate::service::tag_service::TagRewriter;
use log::{info, warn};

/// Outcome of a title refresh over one or more bookmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Bookmarks whose title was written.
    pub updated: usize,
    /// Bookmarks left untouched because the fetched title was empty.
    pub skipped: usize,
}

/// Maps a user-facing index to a target, rejecting negative values.
pub fn target_from_index(index: i64) -> RepoResult<Target> {
    Target::from_index(index).ok_or(RepoError::InvalidIndex(index))
}

/// Maps a user-facing index to a concrete id, rejecting the `0` sentinel.
pub fn id_from_index(index: i64) -> RepoResult<BookmarkId> {
    match target_from_index(index)? {
        Target::One(id) => Ok(id),
        Target::All => Err(RepoError::InvalidIndex(index)),
    }
}

/// Bookmark service facade over a repository and a title fetcher.
pub struct BookmarkService<R: BookmarkRepository, F: TitleFetcher> {
    repo: R,
    fetcher: F,
}

impl<R: BookmarkRepository, F: TitleFetcher> BookmarkService<R, F> {
    pub fn new(repo: R, fetcher: F) -> Self {
        Self { repo, fetcher }
    }

    /// Adds a bookmark under the next free id (`max + 1`).
    pub fn add(&mut self, new: &NewBookmark) -> RepoResult<Bookmark> {
        self.write_new(None, new)
    }

    /// Adds a bookmark under a caller-chosen free id.
    pub fn insert_at(&mut self, id: BookmarkId, new: &NewBookmark) -> RepoResult<Bookmark> {
        if id == 0 {
            return Err(RepoError::InvalidIndex(0));
        }
        self.write_new(Some(id), new)
    }

    /// Replaces url, title and tags of an existing bookmark.
    pub fn update(&mut self, id: BookmarkId, new: &NewBookmark) -> RepoResult<Bookmark> {
        if id == 0 {
            return Err(RepoError::InvalidIndex(0));
        }
        if self.repo.get_bookmark(id)?.is_none() {
            return Err(RepoError::NotFound(id));
        }
        self.ensure_url_free(&new.url, Some(id))?;

        let tags = canonicalize_tags(new.tags.as_slice());
        let title = self.resolve_title(&new.url, &new.title);
        self.repo.update_bookmark(id, &new.url, &title, &tags)?;
        info!("event=bookmark_update module=service status=ok id={id}");

        self.read_back(id)
    }

    /// Refreshes titles of the targeted bookmarks in ascending id order.
    ///
    /// With `TitleInput::Manual` the fixed string is written to every target
    /// without fetching. A fetched empty title leaves the stored one as is.
    pub fn refresh_titles(&mut self, target: Target, title: &TitleInput) -> RepoResult<RefreshReport> {
        let bookmarks = self.get(target)?;
        let mut report = RefreshReport::default();

        for bookmark in bookmarks {
            let next = match title {
                TitleInput::Manual(fixed) => fixed.clone(),
                TitleInput::Fetch => self.fetcher.fetch_title(&bookmark.url),
            };

            if next.is_empty() && matches!(title, TitleInput::Fetch) {
                warn!(
                    "event=title_refresh module=service status=skip id={} reason=empty_title",
                    bookmark.id
                );
                report.skipped += 1;
                continue;
            }

            self.repo.set_title(bookmark.id, &next)?;
            report.updated += 1;
        }

        info!(
            "event=title_refresh module=service status=ok updated={} skipped={}",
            report.updated, report.skipped
        );
        Ok(report)
    }

    /// Deletes the targeted bookmarks and returns how many were removed.
    ///
    /// `Target::All` only proceeds when `confirm` returns `true`; a declined
    /// confirmation removes nothing. Single deletes compact ids afterwards.
    pub fn delete(&mut self, target: Target, confirm: impl FnOnce() -> bool) -> RepoResult<usize> {
        match target {
            Target::All => {
                if !confirm() {
                    info!("event=bookmark_delete module=service status=skip scope=all reason=declined");
                    return Ok(0);
                }
                let removed = self.repo.delete_all()?;
                info!("event=bookmark_delete module=service status=ok scope=all removed={removed}");
                Ok(removed)
            }
            Target::One(id) => {
                let moved_from = self.repo.delete_bookmark(id)?;
                match moved_from {
                    Some(from) => info!(
                        "event=bookmark_delete module=service status=ok id={id} compacted_from={from}"
                    ),
                    None => info!("event=bookmark_delete module=service status=ok id={id}"),
                }
                Ok(1)
            }
        }
    }

    /// Returns the targeted bookmarks in id order.
    pub fn get(&self, target: Target) -> RepoResult<Vec<Bookmark>> {
        match target {
            Target::All => self.repo.list_bookmarks(),
            Target::One(id) => self
                .repo
                .get_bookmark(id)?
                .map(|bookmark| vec![bookmark])
                .ok_or(RepoError::NotFound(id)),
        }
    }

    pub fn count(&self) -> RepoResult<u32> {
        self.repo.count()
    }

    /// Bulk tag rename/delete over the same repository.
    pub fn tag_rewriter(&mut self) -> TagRewriter<'_, R> {
        TagRewriter::new(&mut self.repo)
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    fn write_new(&mut self, id: Option<BookmarkId>, new: &NewBookmark) -> RepoResult<Bookmark> {
        if new.url.is_empty() {
            return Err(RepoError::EmptyUrl);
        }
        self.ensure_url_free(&new.url, None)?;
        if let Some(requested) = id {
            if self.repo.get_bookmark(requested)?.is_some() {
                return Err(RepoError::IndexOccupied(requested));
            }
        }

        let tags = canonicalize_tags(new.tags.as_slice());
        let title = self.resolve_title(&new.url, &new.title);
        let id = self.repo.insert_bookmark(id, &new.url, &title, &tags)?;
        info!("event=bookmark_add module=service status=ok id={id}");

        self.read_back(id)
    }

    fn ensure_url_free(&self, url: &str, owner: Option<BookmarkId>) -> RepoResult<()> {
        match self.repo.find_id_by_url(url)? {
            Some(existing) if Some(existing) != owner => {
                warn!("event=bookmark_write module=service status=error error_code=duplicate_url id={existing}");
                Err(RepoError::DuplicateUrl(url.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn resolve_title(&self, url: &str, title: &TitleInput) -> String {
        match title {
            TitleInput::Manual(value) => value.clone(),
            TitleInput::Fetch => self.fetcher.fetch_title(url),
        }
    }

    fn read_back(&self, id: BookmarkId) -> RepoResult<Bookmark> {
        self.repo.get_bookmark(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("bookmark {id} missing in read-back"))
        })
    }
}
