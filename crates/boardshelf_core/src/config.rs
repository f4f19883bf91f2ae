//! Runtime configuration and on-disk layout.
//!
//! # Responsibility
//! - Derive every storage location from one data directory.
//! - Hold host-tunable settings with build-mode aware defaults.
//!
//! # Invariants
//! - All paths are children of `data_dir`; nothing is written elsewhere.

use crate::logging::default_log_level;
use crate::service::autosave::DEFAULT_AUTOSAVE_DELAY;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BOARDS_DIR_NAME: &str = "boards";
const DB_FILE_NAME: &str = "boards.db";
const LEGACY_INDEX_FILE_NAME: &str = "index.json";
const LOGS_DIR_NAME: &str = "logs";

/// On-disk layout rooted at one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfPaths {
    data_dir: PathBuf,
}

impl ShelfPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn boards_dir(&self) -> PathBuf {
        self.data_dir.join(BOARDS_DIR_NAME)
    }

    pub fn db_path(&self) -> PathBuf {
        self.boards_dir().join(DB_FILE_NAME)
    }

    /// Pre-SQLite index file.
    pub fn legacy_index_path(&self) -> PathBuf {
        self.boards_dir().join(LEGACY_INDEX_FILE_NAME)
    }

    /// Pre-SQLite per-board canvas file.
    pub fn legacy_board_data_path(&self, board_id: &str) -> PathBuf {
        self.boards_dir().join(format!("{board_id}.json"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join(LOGS_DIR_NAME)
    }
}

/// Host settings for one shelf session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfConfig {
    pub paths: ShelfPaths,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    pub autosave_delay: Duration,
}

impl ShelfConfig {
    /// Defaults for `data_dir`: build-mode log level, 1 s autosave delay.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ShelfPaths::new(data_dir),
            log_level: default_log_level().to_string(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ShelfConfig, ShelfPaths};
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn paths_are_rooted_at_data_dir() {
        let paths = ShelfPaths::new("/srv/shelf");
        assert_eq!(paths.db_path(), Path::new("/srv/shelf/boards/boards.db"));
        assert_eq!(
            paths.legacy_board_data_path("b1"),
            Path::new("/srv/shelf/boards/b1.json")
        );
        assert_eq!(paths.logs_dir(), Path::new("/srv/shelf/logs"));
    }

    #[test]
    fn config_defaults_to_one_second_autosave() {
        let config = ShelfConfig::new("/srv/shelf").with_log_level("warn");
        assert_eq!(config.autosave_delay, Duration::from_millis(1000));
        assert_eq!(config.log_level, "warn");
    }
}
