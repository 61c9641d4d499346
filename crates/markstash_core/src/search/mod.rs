//! Keyword search entry points.
//!
//! # Responsibility
//! - Expose ANY/ALL substring queries over url, title and tags.
//! - Keep result ranking inside core so presentation only renders.

pub mod keyword;
