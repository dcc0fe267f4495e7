pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::widgets::ListState;

/// Keep a list selection inside bounds as the underlying data changes
/// (filters shrink the page, deletes remove rows).
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }

  match state.selected() {
    Some(i) if i < len => {}
    Some(_) => state.select(Some(len - 1)),
    None => state.select(Some(0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamps_to_shrinking_list() {
    let mut state = ListState::default();
    state.select(Some(9));

    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(3));
  }

  #[test]
  fn test_selection_defaults_to_first_row() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_empty_list_clears_selection() {
    let mut state = ListState::default();
    state.select(Some(0));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
