use crate::api::User;
use crate::query::{Query, QueryState};
use crate::store::TodoStore;
use crate::theme::Theme;
use crate::ui::ensure_valid_selection;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::UserDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Directory of every user the session knows about.
///
/// The first load reuses the session's one-per-session user fetch; an
/// explicit refresh (`r`) goes back to the network even after a failed
/// session attempt.
pub struct UserListView {
  store: TodoStore,
  query: Query<Vec<User>>,
  list_state: ListState,
}

impl UserListView {
  pub fn new(store: TodoStore) -> Self {
    let store_for_query = store.clone();
    let first = Arc::new(AtomicBool::new(true));

    let mut query = Query::new(move || {
      let store = store_for_query.clone();
      let first = first.clone();
      async move {
        let users = if first.swap(false, Ordering::SeqCst) {
          store.load_users().await
        } else {
          store.refresh_users().await
        };

        let mut list: Vec<User> = users.into_values().collect();
        list.sort_by_key(|u| u.id);
        Ok(list)
      }
    });
    query.fetch();

    Self {
      store,
      query,
      list_state: ListState::default(),
    }
  }

  fn users(&self) -> &[User] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }
}

impl View for UserListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(user) = self.users().get(idx) {
            return ViewAction::Push(Box::new(UserDetailView::new(
              self.store.clone(),
              user.id,
            )));
          }
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
    let len = self.users().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading | QueryState::Idle => " Users (loading...) ".to_string(),
      _ => format!(" Users ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(theme.border());

    if len == 0 && !self.query.is_loading() {
      // The directory stays empty for the session after a failed fetch
      let paragraph = Paragraph::new("No users loaded. Press 'r' to fetch the directory.")
        .block(block)
        .style(theme.dim());
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .users()
      .iter()
      .map(|user| {
        let line = Line::from(vec![
          Span::styled(format!("{:>3} ", user.id), theme.dim()),
          Span::styled(format!("{:<24}", user.name), theme.text()),
          Span::styled(format!("@{:<16}", user.username), theme.accent()),
          Span::styled(user.email.clone(), theme.dim()),
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

  fn breadcrumb_label(&self) -> String {
    "Users".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("Enter", "open").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(40),
    ]
  }
}
