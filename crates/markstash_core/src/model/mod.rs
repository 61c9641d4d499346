//! Domain model for the bookmark store.
//!
//! # Responsibility
//! - Define the record shape shared by repository, search and presentation.
//! - Own the canonical tag string form and its pure transformations.
//!
//! # Invariants
//! - Bookmark ids are dense (`1..=count`) whenever a write call returns.
//! - There is no tombstone state; a bookmark exists or it does not.

pub mod bookmark;
pub mod tags;
