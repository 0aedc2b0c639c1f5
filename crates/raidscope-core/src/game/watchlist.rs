//! Account watchlist file and its hot reload.
//!
//! The file holds one `account id : reason` entry per line. Account ids are
//! matched case-insensitively; malformed lines are skipped.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::tables::SharedTables;
use crate::error::{Error, Result};

/// Default watchlist file name
pub const WATCHLIST_FILE: &str = "playerWatchlist.txt";

/// Written when the watchlist file does not exist yet
pub const WATCHLIST_TEMPLATE: &str =
    "PlayerAcctID : Watchlist reason/comment here (one entry per line)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    entries: HashMap<String, String>,
}

impl Watchlist {
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            let parts: Vec<&str> = line.split(':').collect();
            let [id, reason] = parts.as_slice() else {
                continue;
            };
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            entries
                .entry(id.to_lowercase())
                .or_insert_with(|| reason.trim().to_string());
        }
        Self { entries }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load the watchlist, writing the template file first if it is missing.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(watchlist) => {
                debug!("Loaded {} watchlist entries", watchlist.len());
                Ok(watchlist)
            }
            Err(e) if e.is_not_found() => {
                info!("Creating watchlist template at {}", path.display());
                fs::write(path, WATCHLIST_TEMPLATE)?;
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Reason recorded for `account_id`, if it is watched.
    pub fn reason(&self, account_id: &str) -> Option<&str> {
        self.entries
            .get(&account_id.to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.reason(account_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reload the watchlist file into `tables`, returning the entry count.
pub fn reload_watchlist(path: &Path, tables: &SharedTables) -> Result<usize> {
    let watchlist = Watchlist::load(path)?;
    let count = watchlist.len();
    tables.replace_watchlist(watchlist);
    Ok(count)
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Watches the watchlist file and republishes it on change
pub struct WatchlistMonitor {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl WatchlistMonitor {
    /// Watch `path`'s directory and reload the file whenever it changes.
    pub fn start<P: Into<PathBuf>>(path: P, tables: Arc<SharedTables>) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file: {}", path.display()),
                ))
            })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let reload_path = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_relevant(&event, &file_name) => {
                    match reload_watchlist(&reload_path, &tables) {
                        Ok(count) => info!("Watchlist reloaded ({} entries)", count),
                        Err(e) => warn!("Failed to reload watchlist: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Watchlist watcher error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {} for watchlist changes", dir.display());

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
