//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::api::Todo;

/// Bumped on breaking layout changes; a mismatch drops and recreates the
/// store. The cache is never the source of truth, so nothing is lost.
const SCHEMA_VERSION: i64 = 1;

/// Trait for cache storage backends.
///
/// Object-safe so the store can hold an `Arc<dyn CacheStorage>` and swap in
/// [`NoopStorage`] when caching is disabled or the database can't be opened.
pub trait CacheStorage: Send + Sync {
  /// Get every cached todo, order unspecified.
  fn get_all(&self) -> Result<Vec<Todo>>;

  /// Get the cached todos owned by one user.
  fn get_by_user(&self, user_id: u64) -> Result<Vec<Todo>>;

  /// Upsert a single todo by id.
  fn put(&self, todo: &Todo) -> Result<()>;

  /// Upsert a batch of todos in one transaction.
  fn put_all(&self, todos: &[Todo]) -> Result<()>;

  /// Remove a todo if present; absent ids are a no-op.
  fn delete(&self, id: u64) -> Result<()>;

  /// When the newest record was written, if any.
  fn last_synced(&self) -> Result<Option<DateTime<Utc>>>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled or the database can't be opened - reads
/// always miss and writes are discarded.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get_all(&self) -> Result<Vec<Todo>> {
    Ok(Vec::new()) // Always miss
  }

  fn get_by_user(&self, _user_id: u64) -> Result<Vec<Todo>> {
    Ok(Vec::new()) // Always miss
  }

  fn put(&self, _todo: &Todo) -> Result<()> {
    Ok(()) // Discard
  }

  fn put_all(&self, _todos: &[Todo]) -> Result<()> {
    Ok(()) // Discard
  }

  fn delete(&self, _id: u64) -> Result<()> {
    Ok(()) // Discard
  }

  fn last_synced(&self) -> Result<Option<DateTime<Utc>>> {
    Ok(None) // No cached data
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Create a new SQLite storage at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Create a new SQLite storage at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Create an in-memory storage, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("t9s").join("cache.db"))
  }

  /// Run database migrations, recreating the store on a version mismatch.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let version: i64 = conn
      .pragma_query_value(None, "user_version", |row| row.get(0))
      .map_err(|e| eyre!("Failed to read schema version: {}", e))?;

    if version != 0 && version != SCHEMA_VERSION {
      conn
        .execute_batch("DROP TABLE IF EXISTS todos;")
        .map_err(|e| eyre!("Failed to drop outdated cache schema: {}", e))?;
    }

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    conn
      .pragma_update(None, "user_version", SCHEMA_VERSION)
      .map_err(|e| eyre!("Failed to record schema version: {}", e))?;

    Ok(())
  }
}

/// Schema for the todo cache: one row per todo keyed by id, with a
/// secondary index for lookup by owning user.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    completed INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
"#;

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
  Ok(Todo {
    id: row.get::<_, i64>(0)? as u64,
    user_id: row.get::<_, i64>(1)? as u64,
    title: row.get(2)?,
    completed: row.get(3)?,
  })
}

impl CacheStorage for SqliteStorage {
  fn get_all(&self) -> Result<Vec<Todo>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT id, user_id, title, completed FROM todos")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let todos: Vec<Todo> = stmt
      .query_map([], todo_from_row)
      .map_err(|e| eyre!("Failed to query todos: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(todos)
  }

  fn get_by_user(&self, user_id: u64) -> Result<Vec<Todo>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT id, user_id, title, completed FROM todos WHERE user_id = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let todos: Vec<Todo> = stmt
      .query_map(params![user_id as i64], todo_from_row)
      .map_err(|e| eyre!("Failed to query todos for user {}: {}", user_id, e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(todos)
  }

  fn put(&self, todo: &Todo) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO todos (id, user_id, title, completed, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![todo.id as i64, todo.user_id as i64, todo.title, todo.completed],
      )
      .map_err(|e| eyre!("Failed to store todo {}: {}", todo.id, e))?;

    Ok(())
  }

  fn put_all(&self, todos: &[Todo]) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    for todo in todos {
      conn
        .execute(
          "INSERT OR REPLACE INTO todos (id, user_id, title, completed, cached_at)
           VALUES (?, ?, ?, ?, datetime('now'))",
          params![todo.id as i64, todo.user_id as i64, todo.title, todo.completed],
        )
        .map_err(|e| eyre!("Failed to store todo {}: {}", todo.id, e))?;
    }

    conn
      .execute("COMMIT", [])
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn delete(&self, id: u64) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM todos WHERE id = ?", params![id as i64])
      .map_err(|e| eyre!("Failed to delete todo {}: {}", id, e))?;

    Ok(())
  }

  fn last_synced(&self) -> Result<Option<DateTime<Utc>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let newest: Option<String> = conn
      .query_row("SELECT MAX(cached_at) FROM todos", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query cache age: {}", e))?;

    match newest {
      Some(s) => Ok(Some(parse_datetime(&s)?)),
      None => Ok(None),
    }
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn todo(id: u64, user_id: u64, title: &str, completed: bool) -> Todo {
    Todo {
      id,
      user_id,
      title: title.to_string(),
      completed,
    }
  }

  #[test]
  fn test_put_and_get_all() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put(&todo(1, 1, "first", false)).unwrap();
    storage.put(&todo(2, 2, "second", true)).unwrap();

    let mut all = storage.get_all().unwrap();
    all.sort_by_key(|t| t.id);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "first");
    assert!(!all[0].completed);
    assert!(all[1].completed);
  }

  #[test]
  fn test_put_is_upsert() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put(&todo(1, 1, "before", false)).unwrap();
    storage.put(&todo(1, 1, "after", true)).unwrap();

    let all = storage.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "after");
    assert!(all[0].completed);
  }

  #[test]
  fn test_get_by_user_filters_by_owner() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .put_all(&[
        todo(1, 1, "a", false),
        todo(2, 3, "b", false),
        todo(3, 3, "c", true),
      ])
      .unwrap();

    let mut owned = storage.get_by_user(3).unwrap();
    owned.sort_by_key(|t| t.id);
    assert_eq!(owned.len(), 2);
    assert_eq!(owned[0].id, 2);
    assert_eq!(owned[1].id, 3);

    assert!(storage.get_by_user(99).unwrap().is_empty());
  }

  #[test]
  fn test_delete_absent_id_is_noop() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put(&todo(1, 1, "keep", false)).unwrap();

    storage.delete(42).unwrap();
    assert_eq!(storage.get_all().unwrap().len(), 1);

    storage.delete(1).unwrap();
    assert!(storage.get_all().unwrap().is_empty());
  }

  #[test]
  fn test_put_all_is_idempotent() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let batch = vec![todo(1, 1, "a", false), todo(2, 1, "b", true)];
    storage.put_all(&batch).unwrap();
    storage.put_all(&batch).unwrap();

    assert_eq!(storage.get_all().unwrap().len(), 2);
  }

  #[test]
  fn test_last_synced_tracks_writes() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert!(storage.last_synced().unwrap().is_none());

    storage.put(&todo(1, 1, "a", false)).unwrap();
    assert!(storage.last_synced().unwrap().is_some());
  }

  #[test]
  fn test_version_bump_recreates_store() {
    let path = std::env::temp_dir().join(format!("t9s-version-test-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);

    {
      let storage = SqliteStorage::open_at(&path).unwrap();
      storage.put(&todo(1, 1, "stale", false)).unwrap();
    }

    // A future layout change would leave a different recorded version
    {
      let conn = Connection::open(&path).unwrap();
      conn.pragma_update(None, "user_version", 99).unwrap();
    }

    let storage = SqliteStorage::open_at(&path).unwrap();
    assert!(storage.get_all().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn test_noop_storage_misses_and_discards() {
    let storage = NoopStorage;
    storage.put(&todo(1, 1, "a", false)).unwrap();
    storage.put_all(&[todo(2, 1, "b", true)]).unwrap();
    storage.delete(1).unwrap();

    assert!(storage.get_all().unwrap().is_empty());
    assert!(storage.get_by_user(1).unwrap().is_empty());
    assert!(storage.last_synced().unwrap().is_none());
  }

  #[test]
  fn test_parse_datetime() {
    let parsed = parse_datetime("2024-03-01 12:30:00").unwrap();
    assert_eq!(parsed.timestamp(), 1_709_296_200);
    assert!(parse_datetime("garbage").is_err());
  }
}
