//! Blocking HTTP title fetcher.
//!
//! # Responsibility
//! - Follow redirects manually with a bounded counter.
//! - Retry once on a server error with browser-like request headers.
//!
//! # Invariants
//! - At most `MAX_REDIRECTS + 2` requests are sent per url.
//! - Every request carries a `FETCH_TIMEOUT` deadline.
//! - Only `text/html` bodies are parsed.

use super::title::extract_title;
use super::TitleFetcher;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use url::Url;

/// Per-request timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: u32 = 5;

const USER_AGENT: &str = concat!("markstash/", env!("CARGO_PKG_VERSION"));
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// Why a title could not be fetched. Logged, never surfaced to callers.
#[derive(Debug)]
pub enum FetchError {
    InvalidUrl(String),
    UnsupportedScheme(String),
    TooManyRedirects(u32),
    MissingLocation(u16),
    HttpStatus(u16),
    Transport(String),
    Body(std::io::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(message) => write!(f, "invalid url: {message}"),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported url scheme `{scheme}`"),
            Self::TooManyRedirects(count) => write!(f, "gave up after {count} redirects"),
            Self::MissingLocation(status) => {
                write!(f, "redirect status {status} without a location header")
            }
            Self::HttpStatus(status) => write!(f, "http status {status}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Body(err) => write!(f, "failed to read response body: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Body(err) => Some(err),
            _ => None,
        }
    }
}

enum FetchState {
    Requesting(Url),
    Redirected { from: Url, location: String },
    Retrying(Url),
    Done(String),
    Failed(FetchError),
}

/// Title fetcher backed by a `ureq` agent.
pub struct HttpTitleFetcher {
    agent: ureq::Agent,
    max_redirects: u32,
}

impl Default for HttpTitleFetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT)
    }
}

impl HttpTitleFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        Self {
            agent,
            max_redirects: MAX_REDIRECTS,
        }
    }

    /// Fetches a title, reporting why it failed.
    pub fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let start = Url::parse(url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        let mut state = FetchState::Requesting(start);
        let mut redirects = 0;
        let mut retried = false;

        loop {
            state = match state {
                FetchState::Requesting(target) => self.request(target, retried),
                FetchState::Redirected { from, location } => {
                    redirects += 1;
                    if redirects > self.max_redirects {
                        FetchState::Failed(FetchError::TooManyRedirects(redirects - 1))
                    } else {
                        match from.join(&location) {
                            Ok(next) => {
                                debug!(
                                    "event=title_fetch module=fetch status=redirect hop={redirects} location={next}"
                                );
                                FetchState::Requesting(next)
                            }
                            Err(err) => FetchState::Failed(FetchError::InvalidUrl(format!(
                                "redirect location `{location}`: {err}"
                            ))),
                        }
                    }
                }
                FetchState::Retrying(target) => {
                    retried = true;
                    debug!("event=title_fetch module=fetch status=retry url={target}");
                    FetchState::Requesting(target)
                }
                FetchState::Done(title) => return Ok(title),
                FetchState::Failed(err) => return Err(err),
            };
        }
    }

    fn request(&self, target: Url, retried: bool) -> FetchState {
        if !matches!(target.scheme(), "http" | "https") {
            return FetchState::Failed(FetchError::UnsupportedScheme(target.scheme().to_string()));
        }

        let mut request = self.agent.get(target.as_str()).set("Accept", ACCEPT_HTML);
        request = if retried {
            request
                .set("User-Agent", BROWSER_USER_AGENT)
                .set("Accept-Language", "en-US,en;q=0.8")
                .set("DNT", "1")
        } else {
            request.set("User-Agent", USER_AGENT)
        };

        match request.call() {
            Ok(response) if (300..400).contains(&response.status()) => {
                let status = response.status();
                match response.header("Location") {
                    Some(location) => FetchState::Redirected {
                        from: target,
                        location: location.to_string(),
                    },
                    None => FetchState::Failed(FetchError::MissingLocation(status)),
                }
            }
            Ok(response) => {
                if !response.content_type().eq_ignore_ascii_case("text/html") {
                    return FetchState::Done(String::new());
                }
                match response.into_string() {
                    Ok(body) => FetchState::Done(extract_title(&body)),
                    Err(err) => FetchState::Failed(FetchError::Body(err)),
                }
            }
            Err(ureq::Error::Status(code, _)) if code >= 500 && !retried => {
                FetchState::Retrying(target)
            }
            Err(ureq::Error::Status(code, _)) => FetchState::Failed(FetchError::HttpStatus(code)),
            Err(ureq::Error::Transport(err)) => {
                FetchState::Failed(FetchError::Transport(err.to_string()))
            }
        }
    }
}

impl TitleFetcher for HttpTitleFetcher {
    fn fetch_title(&self, url: &str) -> String {
        let started_at = Instant::now();
        match self.try_fetch(url) {
            Ok(title) => {
                info!(
                    "event=title_fetch module=fetch status=ok duration_ms={} empty={}",
                    started_at.elapsed().as_millis(),
                    title.is_empty()
                );
                title
            }
            Err(err) => {
                warn!(
                    "event=title_fetch module=fetch status=error duration_ms={} url={} error={}",
                    started_at.elapsed().as_millis(),
                    url,
                    err
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchError, HttpTitleFetcher};
    use crate::fetch::TitleFetcher;
    use std::time::Duration;

    #[test]
    fn malformed_url_degrades_to_empty_title() {
        let fetcher = HttpTitleFetcher::new(Duration::from_millis(10));
        assert_eq!(fetcher.fetch_title("not a url"), "");
        assert!(matches!(
            fetcher.try_fetch("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn non_http_scheme_is_not_requested() {
        let fetcher = HttpTitleFetcher::default();
        assert!(matches!(
            fetcher.try_fetch("ftp://example.com/file"),
            Err(FetchError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert_eq!(fetcher.fetch_title("file:///etc/hosts"), "");
    }
}
