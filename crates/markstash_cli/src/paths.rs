//! Data directory and store file layout.
//!
//! # Invariants
//! - The plain store and its encrypted companion never coexist; finding both
//!   is a configuration error raised before the store is opened.

use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

pub const DATA_DIR_ENV: &str = "MARKSTASH_DATA_DIR";
pub const DB_FILE_NAME: &str = "bookmarks.db";
pub const LOCKED_FILE_NAME: &str = "bookmarks.db.enc";

/// Which store file currently exists in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No store yet; opening creates one.
    Empty,
    Plain,
    Locked,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The MARKSTASH_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/markstash/)
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        let from_env = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve_with(explicit, from_env)
    }

    fn resolve_with(explicit: Option<&Path>, from_env: Option<String>) -> CliResult<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(value) = from_env {
            PathBuf::from(value)
        } else {
            xdg::BaseDirectories::with_prefix("markstash")
                .get_data_home()
                .ok_or_else(|| {
                    CliError::Config("could not determine XDG data home directory".into())
                })?
        };

        std::fs::create_dir_all(&root).map_err(|err| {
            CliError::Config(format!(
                "data directory `{}` does not exist and could not be created: {err}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILE_NAME)
    }

    pub fn locked_path(&self) -> PathBuf {
        self.root.join(LOCKED_FILE_NAME)
    }

    pub fn store_state(&self) -> CliResult<StoreState> {
        match (self.db_path().exists(), self.locked_path().exists()) {
            (true, true) => Err(CliError::Config(format!(
                "both `{DB_FILE_NAME}` and `{LOCKED_FILE_NAME}` exist in `{}`; remove one before continuing",
                self.root.display()
            ))),
            (true, false) => Ok(StoreState::Plain),
            (false, true) => Ok(StoreState::Locked),
            (false, false) => Ok(StoreState::Empty),
        }
    }

    /// Returns the plain store path, refusing while the store is locked.
    pub fn open_path(&self) -> CliResult<PathBuf> {
        match self.store_state()? {
            StoreState::Locked => Err(CliError::Config(
                "the store is locked; run `markstash unlock` first".into(),
            )),
            StoreState::Empty | StoreState::Plain => Ok(self.db_path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let explicit = tempfile::tempdir().unwrap();
        let env_dir = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve_with(
            Some(explicit.path()),
            Some(env_dir.path().display().to_string()),
        )
        .unwrap();

        assert_eq!(dir.root(), explicit.path());
        assert_eq!(dir.db_path(), explicit.path().join("bookmarks.db"));
        assert_eq!(dir.locked_path(), explicit.path().join("bookmarks.db.enc"));
    }

    #[test]
    fn environment_is_used_without_explicit_path() {
        let env_dir = tempfile::tempdir().unwrap();
        let nested = env_dir.path().join("nested");
        let dir = DataDir::resolve_with(None, Some(nested.display().to_string())).unwrap();

        assert_eq!(dir.root(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[test]
    fn store_state_tracks_files_and_rejects_both() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve_with(Some(tmp.path()), None).unwrap();
        assert_eq!(dir.store_state().unwrap(), StoreState::Empty);

        std::fs::write(dir.locked_path(), b"sealed").unwrap();
        assert_eq!(dir.store_state().unwrap(), StoreState::Locked);
        assert!(matches!(dir.open_path(), Err(CliError::Config(_))));

        std::fs::write(dir.db_path(), b"").unwrap();
        assert!(matches!(dir.store_state(), Err(CliError::Config(_))));

        std::fs::remove_file(dir.locked_path()).unwrap();
        assert_eq!(dir.store_state().unwrap(), StoreState::Plain);
        assert_eq!(dir.open_path().unwrap(), dir.db_path());
    }
}
