use crate::{APP_AUTHOR, APP_NAME, APP_QUALIFIER};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
    songs_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Result<Self, DirsError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
            .ok_or(DirsError::MissingProjectDirs)?;
        let log_dir = dirs.data_dir().join("logs");
        let songs_dir = dirs.data_dir().join("songs");
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
            log_dir,
            songs_dir,
        })
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.log_dir,
            &self.songs_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Directory holding downloaded song files, shared between the cache's
    /// eviction deletions and the song store's writes.
    pub fn songs_dir(&self) -> &Path {
        &self.songs_dir
    }
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("unable to determine project directories for Encore")]
    MissingProjectDirs,
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_returns_dirs() {
        let dirs = AppDirs::discover().expect("should build dirs");
        assert!(dirs.config_dir().ends_with(APP_NAME));
        assert!(dirs.log_dir().ends_with("logs"));
        assert!(dirs.songs_dir().ends_with("songs"));
    }
}
