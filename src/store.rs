use clap::ValueEnum;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::StoreError;

pub const LAST_VIEW_KEY: &str = "lastView";

/// Opaque string key-value store for UI preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Preferences kept in a single-table SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let start_time = Instant::now();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        info!(
            action = "open",
            component = "preference_store",
            path = ?path,
            duration_ms = start_time.elapsed().as_millis(),
            "Opened preference database"
        );
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl PreferenceStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-process store, used when no preference file is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

pub fn default_preferences_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".infradash")
        .join("preferences.db")
}

/// Top-level dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Graph,
    Table,
    List,
    Analysis,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Graph => "graph",
            View::Table => "table",
            View::List => "list",
            View::Analysis => "analysis",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graph" => Ok(View::Graph),
            "table" => Ok(View::Table),
            "list" => Ok(View::List),
            "analysis" => Ok(View::Analysis),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// Last view the user was on, `graph` when unknown.
pub fn load_last_view(store: &dyn PreferenceStore) -> View {
    match store.get(LAST_VIEW_KEY) {
        Ok(Some(saved)) => saved.parse().unwrap_or_else(|e: String| {
            warn!(action = "load", component = "last_view", error = %e, "Ignoring saved view");
            View::default()
        }),
        Ok(None) => View::default(),
        Err(e) => {
            warn!(action = "load", component = "last_view", error = %e, "Error loading saved view");
            View::default()
        }
    }
}

pub fn save_last_view(store: &dyn PreferenceStore, view: View) -> Result<(), StoreError> {
    store.set(LAST_VIEW_KEY, view.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_store_upserts_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("tableColumns").unwrap(), None);
        store.set("tableColumns", "[\"domain\"]").unwrap();
        store.set("tableColumns", "[\"cms\"]").unwrap();
        assert_eq!(
            store.get("tableColumns").unwrap().as_deref(),
            Some("[\"cms\"]")
        );
    }

    #[test]
    fn last_view_defaults_to_graph() {
        let store = MemoryStore::default();
        assert_eq!(load_last_view(&store), View::Graph);
        store.set(LAST_VIEW_KEY, "timeline").unwrap();
        assert_eq!(load_last_view(&store), View::Graph);
    }

    #[test]
    fn last_view_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        save_last_view(&store, View::List).unwrap();
        assert_eq!(load_last_view(&store), View::List);
    }
}
