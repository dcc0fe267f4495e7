//! Synchronization facade between the remote todo API and the local cache.
//!
//! Reads prefer warm data (session memory, then the cache) and fall back to
//! the network; mutations apply to session memory first and persist in the
//! background. Cache failures never surface to callers - they are reported
//! through [`CacheErrorSink`] and degraded to misses.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Report, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::api::{Todo, TodoApi, User};
use crate::cache::CacheStorage;

/// Observer for cache failures the store degrades instead of surfacing.
///
/// The cache is an accelerator, so a failing read falls through to the next
/// tier and a failing write is dropped. Failures still need a home; they
/// land here, and the default sink records them in the log.
pub trait CacheErrorSink: Send + Sync {
  fn on_cache_error(&self, op: &str, err: &Report);
}

/// Sink that records cache failures in the log.
pub struct LogErrorSink;

impl CacheErrorSink for LogErrorSink {
  fn on_cache_error(&self, op: &str, err: &Report) {
    warn!("Cache {} failed: {}", op, err);
  }
}

/// Which tier satisfied a per-user todo lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoSource {
  /// Served from todos already loaded this session.
  Memory,
  /// Served from the local cache.
  Cache,
  /// Fetched from the remote API.
  Remote,
}

impl TodoSource {
  pub fn label(&self) -> &'static str {
    match self {
      TodoSource::Memory => "memory",
      TodoSource::Cache => "cache",
      TodoSource::Remote => "remote",
    }
  }
}

#[derive(Default)]
struct SessionState {
  todos: Option<Vec<Todo>>,
  todo_source: Option<TodoSource>,
  users: Option<HashMap<u64, User>>,
  user_details: HashMap<u64, User>,
}

/// Shared handle over the remote API, the local cache and session memory.
///
/// Cheap to clone; every clone sees the same session. Views read snapshots
/// through the accessors and mutate through [`toggle`](TodoStore::toggle)
/// and [`delete`](TodoStore::delete).
#[derive(Clone)]
pub struct TodoStore {
  api: Arc<dyn TodoApi>,
  storage: Arc<dyn CacheStorage>,
  errors: Arc<dyn CacheErrorSink>,
  state: Arc<Mutex<SessionState>>,
}

impl TodoStore {
  pub fn new(api: Arc<dyn TodoApi>, storage: Arc<dyn CacheStorage>) -> Self {
    Self::with_error_sink(api, storage, Arc::new(LogErrorSink))
  }

  pub fn with_error_sink(
    api: Arc<dyn TodoApi>,
    storage: Arc<dyn CacheStorage>,
    errors: Arc<dyn CacheErrorSink>,
  ) -> Self {
    Self {
      api,
      storage,
      errors,
      state: Arc::new(Mutex::new(SessionState::default())),
    }
  }

  /// Load the todo collection: session memory, then the cache, then remote.
  ///
  /// The first non-empty tier wins. Remote results are adopted into the
  /// session and persisted in the background.
  pub async fn load_todos(&self) -> Result<Vec<Todo>> {
    if let Some(todos) = self.todos() {
      return Ok(todos);
    }

    match self.storage.get_all() {
      Ok(cached) if !cached.is_empty() => {
        debug!("Serving {} todos from cache", cached.len());
        self.adopt_todos(cached.clone(), TodoSource::Cache)?;
        return Ok(cached);
      }
      Ok(_) => {}
      Err(e) => self.errors.on_cache_error("get_all", &e),
    }

    self.refresh_todos().await
  }

  /// Reload the todo collection from the remote API, bypassing warm tiers.
  pub async fn refresh_todos(&self) -> Result<Vec<Todo>> {
    let todos = self
      .api
      .fetch_todos()
      .await
      .map_err(|e| eyre!("Failed to fetch todos: {}", e))?;

    debug!("Fetched {} todos from remote", todos.len());
    self.adopt_todos(todos.clone(), TodoSource::Remote)?;
    self.persist_all(todos.clone());
    Ok(todos)
  }

  /// Load the user directory keyed by id, at most one remote attempt per
  /// session. A failure renders as an empty directory, not an error.
  pub async fn load_users(&self) -> HashMap<u64, User> {
    if let Some(users) = self.state.lock().ok().and_then(|s| s.users.clone()) {
      return users;
    }

    self.refresh_users().await
  }

  /// Re-fetch the user directory. On failure the session keeps whatever
  /// directory it already had.
  pub async fn refresh_users(&self) -> HashMap<u64, User> {
    match self.api.fetch_users().await {
      Ok(list) => {
        let users: HashMap<u64, User> = list.into_iter().map(|u| (u.id, u)).collect();
        debug!("Fetched {} users from remote", users.len());
        if let Ok(mut state) = self.state.lock() {
          state.users = Some(users.clone());
        }
        users
      }
      Err(e) => {
        warn!("Failed to fetch users, rendering without owner details: {}", e);
        match self.state.lock() {
          // Mark the attempt so the session doesn't retry on every load
          Ok(mut state) => state.users.get_or_insert_with(HashMap::new).clone(),
          Err(_) => HashMap::new(),
        }
      }
    }
  }

  /// Resolve the todos for one user through the fallback chain: session
  /// memory, then the local cache, then the remote API. A tier with nothing
  /// for the user is skipped; the winning tier is reported alongside the
  /// todos so callers can show where the data came from.
  pub async fn todos_for_user(&self, user_id: u64) -> Result<(Vec<Todo>, TodoSource)> {
    if let Some(todos) = self.todos() {
      let owned: Vec<Todo> = todos.into_iter().filter(|t| t.user_id == user_id).collect();
      if !owned.is_empty() {
        debug!("Serving todos for user {} from memory", user_id);
        return Ok((owned, TodoSource::Memory));
      }
    }

    match self.storage.get_by_user(user_id) {
      Ok(cached) if !cached.is_empty() => {
        debug!("Serving todos for user {} from cache", user_id);
        return Ok((cached, TodoSource::Cache));
      }
      Ok(_) => {}
      Err(e) => self.errors.on_cache_error("get_by_user", &e),
    }

    let todos = self.api.fetch_todos_by_user(user_id).await?;
    debug!("Fetched {} todos for user {} from remote", todos.len(), user_id);
    self.persist_all(todos.clone());
    Ok((todos, TodoSource::Remote))
  }

  /// Fetch one user, memoized for the session.
  pub async fn fetch_user(&self, user_id: u64) -> Result<User> {
    if let Some(user) = self
      .state
      .lock()
      .ok()
      .and_then(|s| s.user_details.get(&user_id).cloned())
    {
      return Ok(user);
    }

    let user = self.api.fetch_user(user_id).await?;
    if let Ok(mut state) = self.state.lock() {
      state.user_details.insert(user_id, user.clone());
    }
    Ok(user)
  }

  /// Flip completion on a todo in session memory, persisting in the
  /// background. Returns the updated todo, or None for unknown ids.
  pub fn toggle(&self, id: u64) -> Result<Option<Todo>> {
    let updated = {
      let mut state = self
        .state
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;

      state.todos.as_mut().and_then(|todos| {
        todos.iter_mut().find(|t| t.id == id).map(|todo| {
          todo.completed = !todo.completed;
          todo.clone()
        })
      })
    };

    if let Some(todo) = updated.clone() {
      self.persist_one(todo);
    }
    Ok(updated)
  }

  /// Remove a todo from session memory and the cache. The cache delete is
  /// issued even when the session holds no copy; both sides treat absent
  /// ids as a no-op.
  pub fn delete(&self, id: u64) -> Result<bool> {
    let removed = {
      let mut state = self
        .state
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;

      match state.todos.as_mut() {
        Some(todos) => {
          let before = todos.len();
          todos.retain(|t| t.id != id);
          todos.len() != before
        }
        None => false,
      }
    };

    self.purge_one(id);
    Ok(removed)
  }

  /// Todos loaded this session, if any.
  pub fn todos(&self) -> Option<Vec<Todo>> {
    self.state.lock().ok().and_then(|s| s.todos.clone())
  }

  /// The user directory keyed by id; empty until loaded.
  pub fn users(&self) -> HashMap<u64, User> {
    self
      .state
      .lock()
      .ok()
      .and_then(|s| s.users.clone())
      .unwrap_or_default()
  }

  /// The tier that supplied the session's todos, if any were loaded.
  pub fn todo_source(&self) -> Option<TodoSource> {
    self.state.lock().ok().and_then(|s| s.todo_source)
  }

  /// When the cache was last written, if ever.
  pub fn last_synced(&self) -> Option<DateTime<Utc>> {
    match self.storage.last_synced() {
      Ok(ts) => ts,
      Err(e) => {
        self.errors.on_cache_error("last_synced", &e);
        None
      }
    }
  }

  fn adopt_todos(&self, todos: Vec<Todo>, source: TodoSource) -> Result<()> {
    let mut state = self
      .state
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    state.todos = Some(todos);
    state.todo_source = Some(source);
    Ok(())
  }

  fn persist_all(&self, todos: Vec<Todo>) {
    let storage = Arc::clone(&self.storage);
    let errors = Arc::clone(&self.errors);
    tokio::spawn(async move {
      if let Err(e) = storage.put_all(&todos) {
        errors.on_cache_error("put_all", &e);
      }
    });
  }

  fn persist_one(&self, todo: Todo) {
    let storage = Arc::clone(&self.storage);
    let errors = Arc::clone(&self.errors);
    tokio::spawn(async move {
      if let Err(e) = storage.put(&todo) {
        errors.on_cache_error("put", &e);
      }
    });
  }

  fn purge_one(&self, id: u64) {
    let storage = Arc::clone(&self.storage);
    let errors = Arc::clone(&self.errors);
    tokio::spawn(async move {
      if let Err(e) = storage.delete(id) {
        errors.on_cache_error("delete", &e);
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{NoopStorage, SqliteStorage};
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::time::Duration;

  fn todo(id: u64, user_id: u64, title: &str, completed: bool) -> Todo {
    Todo {
      id,
      user_id,
      title: title.to_string(),
      completed,
    }
  }

  fn user(id: u64, name: &str) -> User {
    User {
      id,
      name: name.to_string(),
      username: name.to_lowercase(),
      email: format!("{}@example.com", name.to_lowercase()),
      phone: String::new(),
      website: String::new(),
    }
  }

  struct MockApi {
    todos: Vec<Todo>,
    users: Vec<User>,
    fail_todos: AtomicBool,
    fail_users: AtomicBool,
    todo_calls: AtomicUsize,
    by_user_calls: AtomicUsize,
    user_list_calls: AtomicUsize,
    user_calls: AtomicUsize,
  }

  impl MockApi {
    fn new(todos: Vec<Todo>, users: Vec<User>) -> Arc<Self> {
      Arc::new(Self {
        todos,
        users,
        fail_todos: AtomicBool::new(false),
        fail_users: AtomicBool::new(false),
        todo_calls: AtomicUsize::new(0),
        by_user_calls: AtomicUsize::new(0),
        user_list_calls: AtomicUsize::new(0),
        user_calls: AtomicUsize::new(0),
      })
    }

    fn failing() -> Arc<Self> {
      let api = Self::new(Vec::new(), Vec::new());
      api.fail_todos.store(true, Ordering::SeqCst);
      api.fail_users.store(true, Ordering::SeqCst);
      api
    }
  }

  #[async_trait]
  impl TodoApi for MockApi {
    async fn fetch_todos(&self) -> Result<Vec<Todo>> {
      self.todo_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_todos.load(Ordering::SeqCst) {
        return Err(eyre!("simulated outage"));
      }
      Ok(self.todos.clone())
    }

    async fn fetch_todos_by_user(&self, user_id: u64) -> Result<Vec<Todo>> {
      self.by_user_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_todos.load(Ordering::SeqCst) {
        return Err(eyre!("simulated outage"));
      }
      Ok(
        self
          .todos
          .iter()
          .filter(|t| t.user_id == user_id)
          .cloned()
          .collect(),
      )
    }

    async fn fetch_users(&self) -> Result<Vec<User>> {
      self.user_list_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_users.load(Ordering::SeqCst) {
        return Err(eyre!("simulated outage"));
      }
      Ok(self.users.clone())
    }

    async fn fetch_user(&self, user_id: u64) -> Result<User> {
      self.user_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_users.load(Ordering::SeqCst) {
        return Err(eyre!("simulated outage"));
      }
      self
        .users
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .ok_or_else(|| eyre!("User {} not found", user_id))
    }
  }

  struct FailingStorage;

  impl CacheStorage for FailingStorage {
    fn get_all(&self) -> Result<Vec<Todo>> {
      Err(eyre!("cache unavailable"))
    }

    fn get_by_user(&self, _user_id: u64) -> Result<Vec<Todo>> {
      Err(eyre!("cache unavailable"))
    }

    fn put(&self, _todo: &Todo) -> Result<()> {
      Err(eyre!("cache unavailable"))
    }

    fn put_all(&self, _todos: &[Todo]) -> Result<()> {
      Err(eyre!("cache unavailable"))
    }

    fn delete(&self, _id: u64) -> Result<()> {
      Err(eyre!("cache unavailable"))
    }

    fn last_synced(&self) -> Result<Option<DateTime<Utc>>> {
      Err(eyre!("cache unavailable"))
    }
  }

  #[derive(Default)]
  struct CountingSink {
    ops: Mutex<Vec<String>>,
  }

  impl CountingSink {
    fn ops(&self) -> Vec<String> {
      self.ops.lock().unwrap().clone()
    }
  }

  impl CacheErrorSink for CountingSink {
    fn on_cache_error(&self, op: &str, _err: &Report) {
      self.ops.lock().unwrap().push(op.to_string());
    }
  }

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
  }

  #[tokio::test]
  async fn test_load_todos_prefers_cache_over_remote() {
    let api = MockApi::new(vec![todo(9, 1, "remote", false)], Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage
      .put_all(&[todo(1, 1, "cached a", false), todo(2, 2, "cached b", true)])
      .unwrap();

    let store = TodoStore::new(api.clone(), storage);
    let mut loaded = store.load_todos().await.unwrap();
    loaded.sort_by_key(|t| t.id);

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "cached a");
    assert_eq!(api.todo_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_load_todos_adopts_remote_and_persists() {
    let todos: Vec<Todo> = (1..=200)
      .map(|i| todo(i, i % 10 + 1, &format!("task {}", i), i % 2 == 0))
      .collect();
    let api = MockApi::new(todos, Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let store = TodoStore::new(api.clone(), storage.clone());

    let loaded = store.load_todos().await.unwrap();
    assert_eq!(loaded.len(), 200);
    assert_eq!(store.todos().map(|t| t.len()), Some(200));

    settle().await;
    assert_eq!(storage.get_all().unwrap().len(), 200);

    // Second load is served from session memory
    store.load_todos().await.unwrap();
    assert_eq!(api.todo_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_todo_source_reports_winning_tier() {
    let api = MockApi::new(vec![todo(1, 1, "remote", false)], Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());

    let store = TodoStore::new(api.clone(), storage.clone());
    assert_eq!(store.todo_source(), None);

    store.load_todos().await.unwrap();
    assert_eq!(store.todo_source(), Some(TodoSource::Remote));

    // A fresh session over the now-populated cache reports the cache tier
    let warm = TodoStore::new(api, storage.clone());
    settle().await;
    warm.load_todos().await.unwrap();
    assert_eq!(warm.todo_source(), Some(TodoSource::Cache));
  }

  #[tokio::test]
  async fn test_load_todos_surfaces_stable_error() {
    let api = MockApi::failing();
    let store = TodoStore::new(api, Arc::new(NoopStorage));

    let err = store.load_todos().await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to fetch todos"));
    assert!(store.todos().is_none());
  }

  #[tokio::test]
  async fn test_refresh_todos_bypasses_warm_tiers() {
    let api = MockApi::new(
      vec![todo(1, 1, "fresh", true), todo(2, 1, "new", false)],
      Vec::new(),
    );
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage.put(&todo(1, 1, "stale", false)).unwrap();

    let store = TodoStore::new(api.clone(), storage.clone());
    let loaded = store.load_todos().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(api.todo_calls.load(Ordering::SeqCst), 0);

    let refreshed = store.refresh_todos().await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(api.todo_calls.load(Ordering::SeqCst), 1);

    settle().await;
    let cached = storage.get_by_user(1).unwrap();
    assert_eq!(cached.len(), 2);
    assert!(cached.iter().any(|t| t.title == "fresh"));
  }

  #[tokio::test]
  async fn test_todos_for_user_served_from_memory() {
    let api = MockApi::new(
      vec![
        todo(1, 1, "mine", false),
        todo(2, 2, "theirs", false),
        todo(3, 1, "also mine", true),
      ],
      Vec::new(),
    );
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));
    store.load_todos().await.unwrap();

    let (todos, source) = store.todos_for_user(1).await.unwrap();
    assert_eq!(todos.len(), 2);
    assert_eq!(source, TodoSource::Memory);
    assert_eq!(api.by_user_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_todos_for_user_served_from_cache() {
    let api = MockApi::new(Vec::new(), Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage
      .put_all(&[todo(7, 3, "offline", false), todo(8, 3, "reading", true)])
      .unwrap();

    let store = TodoStore::new(api.clone(), storage);
    let (todos, source) = store.todos_for_user(3).await.unwrap();

    assert_eq!(todos.len(), 2);
    assert_eq!(source, TodoSource::Cache);
    assert_eq!(api.by_user_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_todos_for_user_falls_back_to_remote_and_persists() {
    let api = MockApi::new(vec![todo(5, 5, "remote only", false)], Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let store = TodoStore::new(api.clone(), storage.clone());

    let (todos, source) = store.todos_for_user(5).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(source, TodoSource::Remote);
    assert_eq!(api.by_user_calls.load(Ordering::SeqCst), 1);

    settle().await;
    assert_eq!(storage.get_by_user(5).unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_todos_for_user_skips_tiers_with_nothing_for_the_user() {
    // Session memory is populated, just not for user 9
    let api = MockApi::new(vec![todo(1, 1, "someone else's", false)], Vec::new());
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));
    store.load_todos().await.unwrap();

    let (todos, source) = store.todos_for_user(9).await.unwrap();
    assert!(todos.is_empty());
    assert_eq!(source, TodoSource::Remote);
    assert_eq!(api.by_user_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_todos_for_user_degrades_cache_failure() {
    let api = MockApi::new(vec![todo(1, 4, "rescued", false)], Vec::new());
    let sink = Arc::new(CountingSink::default());
    let store = TodoStore::with_error_sink(api, Arc::new(FailingStorage), sink.clone());

    let (todos, source) = store.todos_for_user(4).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(source, TodoSource::Remote);
    assert!(sink.ops().contains(&"get_by_user".to_string()));
  }

  #[tokio::test]
  async fn test_toggle_preserves_order_and_persists() {
    let todos: Vec<Todo> = (1..=10)
      .map(|i| todo(i, 1, &format!("task {}", i), false))
      .collect();
    let api = MockApi::new(todos, Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let store = TodoStore::new(api, storage.clone());
    store.load_todos().await.unwrap();

    let updated = store.toggle(7).unwrap().unwrap();
    assert!(updated.completed);

    let session = store.todos().unwrap();
    assert_eq!(
      session.iter().map(|t| t.id).collect::<Vec<_>>(),
      (1..=10).collect::<Vec<u64>>()
    );
    assert!(session.iter().find(|t| t.id == 7).unwrap().completed);
    assert!(!session.iter().find(|t| t.id == 6).unwrap().completed);

    settle().await;
    let cached = storage.get_by_user(1).unwrap();
    assert!(cached.iter().find(|t| t.id == 7).unwrap().completed);
  }

  #[tokio::test]
  async fn test_toggle_unknown_id_is_none() {
    let api = MockApi::new(vec![todo(1, 1, "only", false)], Vec::new());
    let store = TodoStore::new(api, Arc::new(NoopStorage));
    store.load_todos().await.unwrap();

    assert!(store.toggle(999).unwrap().is_none());
    assert!(!store.todos().unwrap()[0].completed);
  }

  #[tokio::test]
  async fn test_toggle_survives_cache_failure() {
    let api = MockApi::new(vec![todo(1, 1, "flaky disk", false)], Vec::new());
    let sink = Arc::new(CountingSink::default());
    let store = TodoStore::with_error_sink(api, Arc::new(FailingStorage), sink.clone());
    store.load_todos().await.unwrap();

    let updated = store.toggle(1).unwrap().unwrap();
    assert!(updated.completed);
    assert!(store.todos().unwrap()[0].completed);

    settle().await;
    let ops = sink.ops();
    assert!(ops.contains(&"get_all".to_string()));
    assert!(ops.contains(&"put_all".to_string()));
    assert!(ops.contains(&"put".to_string()));
  }

  #[tokio::test]
  async fn test_delete_removes_and_persists() {
    let todos: Vec<Todo> = (1..=5)
      .map(|i| todo(i, 1, &format!("task {}", i), false))
      .collect();
    let api = MockApi::new(todos, Vec::new());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let store = TodoStore::new(api, storage.clone());
    store.load_todos().await.unwrap();
    settle().await;

    assert!(store.delete(3).unwrap());
    let ids: Vec<u64> = store.todos().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    settle().await;
    assert!(!storage.get_all().unwrap().iter().any(|t| t.id == 3));
  }

  #[tokio::test]
  async fn test_delete_absent_id_is_noop() {
    let api = MockApi::new(vec![todo(1, 1, "only", false)], Vec::new());
    let store = TodoStore::new(api, Arc::new(NoopStorage));
    store.load_todos().await.unwrap();

    assert!(!store.delete(999).unwrap());
    assert_eq!(store.todos().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_load_users_maps_by_id_and_memoizes() {
    let api = MockApi::new(Vec::new(), vec![user(1, "Ada"), user(2, "Grace")]);
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));

    let users = store.load_users().await;
    assert_eq!(users.len(), 2);
    assert_eq!(users.get(&1).map(|u| u.name.as_str()), Some("Ada"));

    store.load_users().await;
    assert_eq!(api.user_list_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_load_users_failure_degrades_to_empty() {
    let api = MockApi::failing();
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));

    assert!(store.load_users().await.is_empty());

    // The failed attempt is not retried within the session
    store.load_users().await;
    assert_eq!(api.user_list_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refresh_users_retries_after_failure() {
    let api = MockApi::new(Vec::new(), vec![user(1, "Ada")]);
    api.fail_users.store(true, Ordering::SeqCst);
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));

    assert!(store.load_users().await.is_empty());

    api.fail_users.store(false, Ordering::SeqCst);
    let users = store.refresh_users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(store.users().len(), 1);
  }

  #[tokio::test]
  async fn test_fetch_user_memoizes_within_session() {
    let api = MockApi::new(Vec::new(), vec![user(3, "Linus")]);
    let store = TodoStore::new(api.clone(), Arc::new(NoopStorage));

    assert_eq!(store.fetch_user(3).await.unwrap().name, "Linus");
    store.fetch_user(3).await.unwrap();
    assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_user_unknown_propagates_error() {
    let api = MockApi::new(Vec::new(), Vec::new());
    let store = TodoStore::new(api, Arc::new(NoopStorage));

    let err = store.fetch_user(42).await.unwrap_err();
    assert!(err.to_string().contains("User 42 not found"));
  }
}
