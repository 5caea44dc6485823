//! Where the shelf keeps its files. Defaults live under the user's home
//! directory; two environment variables redirect them for testing or for
//! keeping several collections apart.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".cookbook-shelf";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "hipster_cookbooks.db";

pub const DB_PATH_ENV: &str = "COOKBOOK_SHELF_DB";
pub const LOG_DIR_ENV: &str = "COOKBOOK_SHELF_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    /// Resolve paths from the environment, falling back to the home
    /// directory defaults.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| env::var(key).ok(), default_data_dir)
    }

    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        data_dir: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_override = non_blank(DB_PATH_ENV).map(PathBuf::from);
        let log_override = non_blank(LOG_DIR_ENV).map(PathBuf::from);

        let (db_path, log_dir) = match (db_override, log_override) {
            (Some(db), Some(logs)) => (db, logs),
            (Some(db), None) => {
                let logs = db
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                (db, logs)
            }
            (None, logs) => {
                let dir = data_dir()?;
                let logs = logs.unwrap_or_else(|| dir.clone());
                (dir.join(DB_FILE_NAME), logs)
            }
        };

        Ok(Self { db_path, log_dir })
    }
}

/// `~/.cookbook-shelf`
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
