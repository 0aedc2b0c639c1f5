//! Classification tables published as immutable snapshots.
//!
//! Readers take a snapshot with [`SharedTables::load`] and keep using it for
//! the whole tick; reloads publish a new snapshot without blocking them.

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::names::NameTables;
use super::watchlist::Watchlist;

#[derive(Debug, Clone, Default)]
pub struct ClassificationTables {
    pub names: Arc<NameTables>,
    pub watchlist: Watchlist,
}

impl ClassificationTables {
    pub fn builtin() -> Self {
        Self {
            names: Arc::new(NameTables::builtin()),
            watchlist: Watchlist::default(),
        }
    }

    pub fn with_watchlist(mut self, watchlist: Watchlist) -> Self {
        self.watchlist = watchlist;
        self
    }
}

/// Atomically swappable handle to the current [`ClassificationTables`]
pub struct SharedTables {
    current: ArcSwap<ClassificationTables>,
}

impl SharedTables {
    pub fn new(tables: ClassificationTables) -> Self {
        Self {
            current: ArcSwap::from_pointee(tables),
        }
    }

    pub fn load(&self) -> Arc<ClassificationTables> {
        self.current.load_full()
    }

    pub fn store(&self, tables: ClassificationTables) {
        self.current.store(Arc::new(tables));
    }

    /// Publish a new watchlist, keeping the current name tables.
    pub fn replace_watchlist(&self, watchlist: Watchlist) {
        self.current.rcu(|current| ClassificationTables {
            names: Arc::clone(&current.names),
            watchlist: watchlist.clone(),
        });
    }
}

impl Default for SharedTables {
    fn default() -> Self {
        Self::new(ClassificationTables::builtin())
    }
}
