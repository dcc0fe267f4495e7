use super::KeyResult;
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the confirm dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  /// Confirmed; carries the id the dialog was opened with
  Confirmed(u64),
  /// Declined or dismissed
  Cancelled,
}

/// Centered yes/no dialog, used before destructive actions
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  id: u64,
  message: String,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the dialog for the given subject id
  pub fn show(&mut self, id: u64, message: String) {
    self.active = true;
    self.id = id;
    self.message = message;
  }

  fn hide(&mut self) {
    self.active = false;
    self.message.clear();
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        let id = self.id;
        self.hide();
        KeyResult::Event(ConfirmEvent::Confirmed(id))
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the dialog overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
    if !self.active {
      return;
    }

    let width = (area.width * 50 / 100).clamp(30, 56).min(area.width);
    let height = 5;

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(theme.error())
      .title(" Delete todo ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    let message = Paragraph::new(self.message.clone())
      .style(theme.text())
      .wrap(Wrap { trim: true });
    frame.render_widget(message, chunks[0]);

    let hint = Line::from(vec![
      Span::styled("y", theme.emphasis()),
      Span::styled("/Enter delete   ", theme.dim()),
      Span::styled("n", theme.emphasis()),
      Span::styled("/Esc keep", theme.dim()),
    ]);
    frame.render_widget(Paragraph::new(hint), chunks[1]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_y_confirms_with_id() {
    let mut dialog = ConfirmDialog::new();
    dialog.show(7, "Delete \"buy milk\"?".to_string());

    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed(7))
    );
    assert!(!dialog.is_active());
  }

  #[test]
  fn test_n_cancels() {
    let mut dialog = ConfirmDialog::new();
    dialog.show(7, "Delete?".to_string());

    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('n'))),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
  }

  #[test]
  fn test_other_keys_stay_in_dialog() {
    let mut dialog = ConfirmDialog::new();
    dialog.show(7, "Delete?".to_string());

    assert_eq!(dialog.handle_key(key(KeyCode::Char('j'))), KeyResult::Handled);
    assert!(dialog.is_active());
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut dialog = ConfirmDialog::new();
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::NotHandled
    );
  }
}
