//! Page title resolution for bookmark writes.
//!
//! # Responsibility
//! - Define the `TitleFetcher` seam consumed by the bookmark service.
//! - Provide the blocking HTTP implementation and HTML title extraction.
//!
//! # Invariants
//! - Fetching never fails the surrounding write: every failure degrades to an
//!   empty title and is logged.

mod http;
mod title;

pub use http::{FetchError, HttpTitleFetcher, FETCH_TIMEOUT, MAX_REDIRECTS};
pub use title::extract_title;

/// Resolves a best-effort page title for a url.
pub trait TitleFetcher {
    /// Returns the page title, or an empty string on any failure.
    fn fetch_title(&self, url: &str) -> String;
}

impl<F> TitleFetcher for F
where
    F: Fn(&str) -> String,
{
    fn fetch_title(&self, url: &str) -> String {
        self(url)
    }
}
