use super::KeyResult;
use crate::api::User;
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the user picker that the parent view handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPickerEvent {
  /// Owner filter chosen; None means "all users"
  Selected(Option<u64>),
  /// Picker cancelled
  Cancelled,
}

/// Overlay for picking the owner filter: "All users" plus every user the
/// session knows about
#[derive(Debug, Clone, Default)]
pub struct UserPicker {
  active: bool,
  users: Vec<User>,
  selected: usize,
}

impl UserPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker over the given users, pre-selecting the current filter
  pub fn show(&mut self, mut users: Vec<User>, current: Option<u64>) {
    users.sort_by_key(|u| u.id);

    self.selected = match current {
      Some(id) => users.iter().position(|u| u.id == id).map_or(0, |i| i + 1),
      None => 0,
    };
    self.users = users;
    self.active = true;
  }

  fn hide(&mut self) {
    self.active = false;
    self.users.clear();
    self.selected = 0;
  }

  // Entry 0 is "All users"
  fn entry_count(&self) -> usize {
    self.users.len() + 1
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<UserPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(UserPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let choice = self
          .selected
          .checked_sub(1)
          .and_then(|i| self.users.get(i))
          .map(|u| u.id);
        self.hide();
        KeyResult::Event(UserPickerEvent::Selected(choice))
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % self.entry_count();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = self
          .selected
          .checked_sub(1)
          .unwrap_or(self.entry_count() - 1);
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
    if !self.active {
      return;
    }

    let widest = self
      .users
      .iter()
      .map(|u| u.name.len() + u.username.len() + 8)
      .max()
      .unwrap_or(12);
    let width = (widest as u16 + 4).clamp(24, area.width.saturating_sub(4).max(24));
    let height = (self.entry_count() as u16 + 2).min(area.height.saturating_sub(2).max(3));

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(theme.emphasis())
      .title(" Filter by user ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let mut items = vec![ListItem::new(Line::from(Span::styled(
      "All users",
      theme.accent(),
    )))];
    items.extend(self.users.iter().map(|user| {
      let line = Line::from(vec![
        Span::styled(format!("{:>3} ", user.id), theme.dim()),
        Span::styled(user.name.clone(), theme.text()),
        Span::styled(format!(" @{}", user.username), theme.dim()),
      ]);
      ListItem::new(line)
    }));

    let list = List::new(items).highlight_style(theme.selection());

    let mut state = ListState::default();
    state.select(Some(self.selected));
    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn user(id: u64, name: &str) -> User {
    User {
      id,
      name: name.to_string(),
      username: name.to_lowercase(),
      email: String::new(),
      phone: String::new(),
      website: String::new(),
    }
  }

  #[test]
  fn test_enter_on_first_entry_clears_filter() {
    let mut picker = UserPicker::new();
    picker.show(vec![user(1, "Ada")], Some(1));

    // Pre-selected on Ada; move up to "All users"
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(UserPickerEvent::Selected(None))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_users_sorted_by_id_for_selection() {
    let mut picker = UserPicker::new();
    picker.show(vec![user(9, "Zoe"), user(2, "Ada")], None);

    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(UserPickerEvent::Selected(Some(2)))
    );
  }

  #[test]
  fn test_preselects_current_filter() {
    let mut picker = UserPicker::new();
    picker.show(vec![user(1, "Ada"), user(2, "Bo")], Some(2));

    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(UserPickerEvent::Selected(Some(2)))
    );
  }

  #[test]
  fn test_esc_cancels() {
    let mut picker = UserPicker::new();
    picker.show(vec![user(1, "Ada")], None);

    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(UserPickerEvent::Cancelled)
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_navigation_wraps() {
    let mut picker = UserPicker::new();
    picker.show(vec![user(1, "Ada")], None);

    // Two entries: All users, Ada
    picker.handle_key(key(KeyCode::Down));
    picker.handle_key(key(KeyCode::Down));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(UserPickerEvent::Selected(None))
    );
  }
}
