//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define row-level data access contracts for bookmarks.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`DuplicateUrl`, `IndexOccupied`,
//!   `NotFound`) instead of raw constraint failures.
//! - Ids stay dense after every delete.

pub mod bookmark_repo;
mod compaction;
