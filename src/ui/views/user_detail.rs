use crate::api::{Todo, User};
use crate::query::{Query, QueryState};
use crate::store::{TodoSource, TodoStore};
use crate::theme::Theme;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{checkbox, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::warn;

/// Per-user page: the user card plus their todos.
///
/// The todos resolve through the store's fallback chain (session memory,
/// cache, remote). Only the user lookup can put the view in an error
/// state; a todos failure degrades to an empty list with a log line, so
/// the page still renders whatever it has.
pub struct UserDetailView {
  label: String,
  user_query: Query<User>,
  todos_query: Query<(Vec<Todo>, TodoSource)>,
  list_state: ListState,
}

impl UserDetailView {
  pub fn new(store: TodoStore, user_id: u64) -> Self {
    let store_for_user = store.clone();
    let mut user_query = Query::new(move || {
      let store = store_for_user.clone();
      async move {
        store
          .fetch_user(user_id)
          .await
          .map_err(|_| "User not found".to_string())
      }
    });
    user_query.fetch();

    let mut todos_query = Query::new(move || {
      let store = store.clone();
      async move {
        match store.todos_for_user(user_id).await {
          Ok(result) => Ok(result),
          Err(e) => {
            warn!("Failed to load todos for user {}: {}", user_id, e);
            Ok((Vec::new(), TodoSource::Remote))
          }
        }
      }
    });
    todos_query.fetch();

    Self {
      label: format!("User {}", user_id),
      user_query,
      todos_query,
      list_state: ListState::default(),
    }
  }

  /// A view for an id that never parsed; behaves like a remote miss
  pub fn invalid(input: &str) -> Self {
    let mut user_query: Query<User> =
      Query::new(|| async { Err("User not found".to_string()) });
    user_query.fetch();

    let mut todos_query: Query<(Vec<Todo>, TodoSource)> =
      Query::new(|| async { Ok((Vec::new(), TodoSource::Memory)) });
    todos_query.fetch();

    let input = input.trim();
    Self {
      label: format!("User {}", if input.is_empty() { "?" } else { input }),
      user_query,
      todos_query,
      list_state: ListState::default(),
    }
  }

  fn todos(&self) -> &[Todo] {
    self
      .todos_query
      .data()
      .map(|(todos, _)| todos.as_slice())
      .unwrap_or(&[])
  }

  fn render_card(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let title = match self.user_query.state() {
      QueryState::Loading | QueryState::Idle => format!(" {} (loading...) ", self.label),
      QueryState::Error(_) => format!(" {} ", self.label),
      QueryState::Success(user) => format!(" {} ", user.name),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(theme.border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(error) = self.user_query.error() {
      let paragraph = Paragraph::new(format!("{}.\n\nPress 'q' to go back.", error))
        .style(theme.error());
      frame.render_widget(paragraph, inner);
      return;
    }

    let user = match self.user_query.data() {
      Some(user) => user,
      None => return,
    };

    let todos = self.todos();
    let completed = todos.iter().filter(|t| t.completed).count();

    let lines = vec![
      Line::from(vec![
        Span::styled(format!(" {} ", user.initials()), theme.selection()),
        Span::raw(" "),
        Span::styled(user.name.clone(), theme.brand()),
        Span::styled(format!("  @{}", user.username), theme.dim()),
      ]),
      Line::from(vec![
        Span::styled("email: ", theme.dim()),
        Span::styled(user.email.clone(), theme.text()),
      ]),
      Line::from(vec![
        Span::styled("phone: ", theme.dim()),
        Span::styled(user.phone.clone(), theme.text()),
        Span::styled("   web: ", theme.dim()),
        Span::styled(user.website.clone(), theme.text()),
      ]),
      Line::from(vec![
        Span::styled(format!("{} todos", todos.len()), theme.text()),
        Span::styled(format!("  ·  {} done", completed), theme.done()),
        Span::styled(
          format!("  ·  {} pending", todos.len() - completed),
          theme.pending(),
        ),
      ]),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn render_todos(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let len = self.todos().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.todos_query.state() {
      QueryState::Loading | QueryState::Idle => " Todos (loading...) ".to_string(),
      QueryState::Success((todos, source)) if !todos.is_empty() => {
        format!(" Todos ({}) · from {} ", todos.len(), source.label())
      }
      _ => " Todos ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(theme.border());

    if len == 0 && !self.todos_query.is_loading() {
      let paragraph = Paragraph::new("No todos for this user.")
        .block(block)
        .style(theme.dim());
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .todos()
      .iter()
      .map(|todo| {
        let mark_style = if todo.completed {
          theme.done()
        } else {
          theme.pending()
        };
        let title_style = if todo.completed {
          theme.dim().add_modifier(Modifier::CROSSED_OUT)
        } else {
          theme.text()
        };

        let line = Line::from(vec![
          Span::styled(format!("{:>4} ", todo.id), theme.dim()),
          Span::styled(checkbox(todo.completed), mark_style),
          Span::raw(" "),
          Span::styled(truncate(&todo.title, 64), title_style),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(theme.selection())
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for UserDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => {
        self.user_query.refetch();
        self.todos_query.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(6), Constraint::Min(1)])
      .split(area);

    self.render_card(frame, chunks[0], theme);
    self.render_todos(frame, chunks[1], theme);
  }

  fn breadcrumb_label(&self) -> String {
    match self.user_query.data() {
      Some(user) => user.name.clone(),
      None => self.label.clone(),
    }
  }

  fn status_line(&self) -> String {
    match self.todos_query.data() {
      Some((todos, source)) if !todos.is_empty() => format!("todos from {}", source.label()),
      _ => String::new(),
    }
  }

  fn tick(&mut self) {
    self.user_query.poll();
    self.todos_query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(40),
    ]
  }
}
