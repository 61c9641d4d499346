use std::error::Error;
use std::fmt::{Display, Formatter};

use markstash_core::db::DbError;
use markstash_core::{RepoError, SearchError};

use crate::crypto::CryptoError;

pub type CliResult<T> = Result<T, CliError>;

/// Top-level command failure, printed to stderr before exiting with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Bad flags, environment or store layout.
    Config(String),
    Repo(RepoError),
    Search(SearchError),
    Crypto(CryptoError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::Crypto(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Json(err) => write!(f, "JSON output failed: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Crypto(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::StorageUnavailable(value))
    }
}

impl From<SearchError> for CliError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<CryptoError> for CliError {
    fn from(value: CryptoError) -> Self {
        Self::Crypto(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
