use crate::api::Todo;
use crate::listing::{self, ListFilters, SortBy};
use crate::query::{Query, QueryState};
use crate::store::{TodoSource, TodoStore};
use crate::theme::Theme;
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, Debouncer, KeyResult, SearchEvent, SearchInput, UserPicker,
  UserPickerEvent,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{checkbox, format_synced, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::UserDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The todo board: filterable, sortable, paged list over the session's
/// todos, with optimistic toggle and delete.
///
/// The load query only drives the loading/error banner; the rows
/// themselves are read from the store on every render so mutations show
/// up immediately.
pub struct TodoListView {
  store: TodoStore,
  todos_query: Query<Vec<Todo>>,
  users_query: Query<usize>,
  filters: ListFilters,
  sort: SortBy,
  page: usize,
  list_state: ListState,
  search: SearchInput,
  debounce: Debouncer,
  confirm: ConfirmDialog,
  user_picker: UserPicker,
  /// Set by `R`; makes the next fetch bypass the warm tiers
  force_refresh: Arc<AtomicBool>,
}

impl TodoListView {
  pub fn new(store: TodoStore) -> Self {
    let force_refresh = Arc::new(AtomicBool::new(false));

    let store_for_todos = store.clone();
    let force = force_refresh.clone();
    let mut todos_query = Query::new(move || {
      let store = store_for_todos.clone();
      let force = force.clone();
      async move {
        let result = if force.swap(false, Ordering::SeqCst) {
          store.refresh_todos().await
        } else {
          store.load_todos().await
        };
        result.map_err(|e| e.to_string())
      }
    });
    todos_query.fetch();

    // The user directory load never fails; a bad fetch leaves it empty
    // and owners render as "Unknown"
    let store_for_users = store.clone();
    let mut users_query = Query::new(move || {
      let store = store_for_users.clone();
      async move { Ok(store.load_users().await.len()) }
    });
    users_query.fetch();

    Self {
      store,
      todos_query,
      users_query,
      filters: ListFilters::default(),
      sort: SortBy::default(),
      page: 0,
      list_state: ListState::default(),
      search: SearchInput::new(),
      debounce: Debouncer::default(),
      confirm: ConfirmDialog::new(),
      user_picker: UserPicker::new(),
      force_refresh,
    }
  }

  /// The session's todos after filter and sort
  fn shaped(&self) -> Vec<Todo> {
    let todos = self.store.todos().unwrap_or_default();
    let mut shaped = listing::filter(&todos, &self.filters);
    listing::sort(&mut shaped, self.sort);
    shaped
  }

  fn selected_todo(&self, shaped: &[Todo]) -> Option<Todo> {
    let page = listing::page_slice(shaped, self.page);
    self
      .list_state
      .selected()
      .and_then(|i| page.get(i))
      .cloned()
  }

  fn set_filter_text(&mut self, text: String) {
    if text != self.filters.text {
      self.filters.text = text;
      self.page = 0;
    }
  }

  fn owner_label(&self, users: &HashMap<u64, crate::api::User>, user_id: u64) -> String {
    users
      .get(&user_id)
      .map(|u| u.name.clone())
      .unwrap_or_else(|| "Unknown".to_string())
  }

  fn source_label(&self) -> String {
    match self.store.todo_source() {
      Some(TodoSource::Cache) => match self.store.last_synced() {
        Some(ts) => format!("cache · synced {}", format_synced(ts)),
        None => "cache".to_string(),
      },
      Some(TodoSource::Remote) | Some(TodoSource::Memory) => "remote".to_string(),
      None => String::new(),
    }
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
    // Stats cover the whole session, not the filtered view
    let stats = listing::stats(&self.store.todos().unwrap_or_default());

    let line = Line::from(vec![
      Span::styled(
        format!(" ✓ {}/{} done", stats.completed, stats.total),
        theme.done(),
      ),
      Span::styled(
        format!("  ·  {} pending", stats.total - stats.completed),
        theme.pending(),
      ),
      Span::styled(format!("  ·  {} users", stats.users), theme.dim()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let shaped = self.shaped();
    self.page = listing::clamp_page(self.page, shaped.len());
    let page = listing::page_slice(&shaped, self.page);
    ensure_valid_selection(&mut self.list_state, page.len());

    let title = match self.todos_query.state() {
      QueryState::Loading | QueryState::Idle => " Todos (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Todos (error: {}) ", e),
      QueryState::Success(_) => format!(
        " Todos ({} of {}) · page {}/{} ",
        shaped.len(),
        self.store.todos().map_or(0, |t| t.len()),
        self.page + 1,
        listing::total_pages(shaped.len())
      ),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(theme.border());

    if page.is_empty() && !self.todos_query.is_loading() {
      let content = if self.todos_query.is_error() {
        "Failed to load todos. Press 'r' to retry."
      } else if self.filters.is_active() {
        "No todos match the current filters."
      } else {
        "No todos."
      };
      let paragraph = Paragraph::new(content).block(block).style(theme.dim());
      frame.render_widget(paragraph, area);
      return;
    }

    let users = self.store.users();
    let items: Vec<ListItem> = page
      .iter()
      .map(|todo| {
        let title_style = if todo.completed {
          theme.dim().add_modifier(Modifier::CROSSED_OUT)
        } else {
          theme.text()
        };
        let mark_style = if todo.completed {
          theme.done()
        } else {
          theme.pending()
        };

        let line = Line::from(vec![
          Span::styled(format!("{:>4} ", todo.id), theme.dim()),
          Span::styled(checkbox(todo.completed), mark_style),
          Span::raw(" "),
          Span::styled(truncate(&todo.title, 56), title_style),
          Span::styled(
            format!("  {}", self.owner_label(&users, todo.user_id)),
            theme.accent(),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(theme.selection().add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for TodoListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(ConfirmEvent::Confirmed(id)) => {
        return match self.store.delete(id) {
          Ok(true) => ViewAction::Flash("Todo deleted".to_string()),
          Ok(false) => ViewAction::None,
          Err(e) => ViewAction::Flash(format!("Delete failed: {}", e)),
        };
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.user_picker.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(UserPickerEvent::Selected(choice)) => {
        self.filters.user = choice;
        self.page = 0;
        return ViewAction::None;
      }
      KeyResult::Event(UserPickerEvent::Cancelled) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.debounce.record(text);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        // Submit applies immediately; drop anything still debouncing
        self.debounce.flush();
        self.set_filter_text(text);
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('h') | KeyCode::Left => {
        if self.page > 0 {
          self.page -= 1;
          self.list_state.select(Some(0));
        }
      }
      KeyCode::Char('l') | KeyCode::Right => {
        let pages = listing::total_pages(self.shaped().len());
        if self.page + 1 < pages {
          self.page += 1;
          self.list_state.select(Some(0));
        }
      }
      KeyCode::Char('t') | KeyCode::Char(' ') => {
        let shaped = self.shaped();
        if let Some(todo) = self.selected_todo(&shaped) {
          if let Err(e) = self.store.toggle(todo.id) {
            return ViewAction::Flash(format!("Toggle failed: {}", e));
          }
        }
      }
      KeyCode::Char('d') => {
        let shaped = self.shaped();
        if let Some(todo) = self.selected_todo(&shaped) {
          self
            .confirm
            .show(todo.id, format!("Delete \"{}\"?", truncate(&todo.title, 40)));
        }
      }
      KeyCode::Char('u') => {
        let users: Vec<_> = self.store.users().into_values().collect();
        self.user_picker.show(users, self.filters.user);
      }
      KeyCode::Char('s') => self.sort = self.sort.toggled(),
      KeyCode::Char('c') => {
        self.filters.completion = self.filters.completion.cycled();
        self.page = listing::clamp_page(self.page, self.shaped().len());
      }
      KeyCode::Char('r') => self.todos_query.refetch(),
      KeyCode::Char('R') => {
        self.force_refresh.store(true, Ordering::SeqCst);
        self.todos_query.refetch();
      }
      KeyCode::Enter => {
        let shaped = self.shaped();
        if let Some(todo) = self.selected_todo(&shaped) {
          return ViewAction::Push(Box::new(UserDetailView::new(
            self.store.clone(),
            todo.user_id,
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(1)])
      .split(area);

    self.render_stats(frame, chunks[0], theme);
    self.render_list(frame, chunks[1], theme);

    self.search.render_overlay(frame, area, theme);
    self.user_picker.render_overlay(frame, area, theme);
    self.confirm.render_overlay(frame, area, theme);
  }

  fn breadcrumb_label(&self) -> String {
    "Todos".to_string()
  }

  fn status_line(&self) -> String {
    let mut parts = vec![
      format!("sort {}", self.sort.label()),
      self.filters.completion.label().to_string(),
    ];
    if let Some(user) = self.filters.user {
      parts.push(format!("user {}", user));
    }
    if !self.filters.text.is_empty() {
      parts.push(format!("\"{}\"", self.filters.text));
    }
    let source = self.source_label();
    if !source.is_empty() {
      parts.push(source);
    }
    parts.join(" · ")
  }

  fn tick(&mut self) {
    self.todos_query.poll();
    self.users_query.poll();

    if let Some(text) = self.debounce.poll() {
      self.set_filter_text(text);
    }

    self.page = listing::clamp_page(self.page, self.shaped().len());
  }

  fn capturing_input(&self) -> bool {
    self.search.is_active() || self.confirm.is_active() || self.user_picker.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("t", "toggle").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("u", "owner").with_priority(50),
      ShortcutInfo::new("s", "sort").with_priority(60),
      ShortcutInfo::new("c", "status").with_priority(70),
      ShortcutInfo::new("h/l", "page").with_priority(80),
      ShortcutInfo::new("r", "refresh").with_priority(90),
      ShortcutInfo::new("q", "quit").with_priority(95),
    ]
  }
}
