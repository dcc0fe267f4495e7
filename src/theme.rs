//! Light and dark presentation themes.
//!
//! The active mode is persisted as a one-line file in the data directory
//! so the choice survives restarts. Persistence is best-effort: failures
//! are logged and ignored.

use ratatui::style::{Color, Style, Stylize};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
  Light,
  #[default]
  Dark,
}

impl ThemeMode {
  pub fn toggled(self) -> Self {
    match self {
      ThemeMode::Light => ThemeMode::Dark,
      ThemeMode::Dark => ThemeMode::Light,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ThemeMode::Light => "light",
      ThemeMode::Dark => "dark",
    }
  }
}

fn parse_mode(s: &str) -> Option<ThemeMode> {
  match s {
    "light" => Some(ThemeMode::Light),
    "dark" => Some(ThemeMode::Dark),
    _ => None,
  }
}

fn state_path() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("t9s").join("theme"))
}

/// The mode persisted by a previous run, if any.
pub fn load_persisted() -> Option<ThemeMode> {
  let contents = std::fs::read_to_string(state_path()?).ok()?;
  parse_mode(contents.trim())
}

/// Persist the mode for the next run.
pub fn persist(mode: ThemeMode) {
  let Some(path) = state_path() else {
    return;
  };

  if let Some(parent) = path.parent() {
    if std::fs::create_dir_all(parent).is_err() {
      return;
    }
  }

  if let Err(e) = std::fs::write(&path, mode.label()) {
    debug!("Failed to persist theme: {}", e);
  }
}

/// Resolved styles for the active mode. Views take this by reference on
/// every render, so toggling repaints everything at once.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
  pub mode: ThemeMode,
}

impl Theme {
  pub fn new(mode: ThemeMode) -> Self {
    Self { mode }
  }

  pub fn toggle(&mut self) {
    self.mode = self.mode.toggled();
  }

  pub fn text(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::White),
      ThemeMode::Light => Style::default().fg(Color::Black),
    }
  }

  pub fn dim(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::DarkGray),
      ThemeMode::Light => Style::default().fg(Color::Gray),
    }
  }

  pub fn brand(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::Cyan).bold(),
      ThemeMode::Light => Style::default().fg(Color::Blue).bold(),
    }
  }

  pub fn accent(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::Cyan),
      ThemeMode::Light => Style::default().fg(Color::Blue),
    }
  }

  pub fn emphasis(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::Yellow).bold(),
      ThemeMode::Light => Style::default().fg(Color::Magenta).bold(),
    }
  }

  pub fn border(&self) -> Style {
    Style::default().fg(Color::Blue)
  }

  pub fn done(&self) -> Style {
    Style::default().fg(Color::Green)
  }

  pub fn pending(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().fg(Color::Yellow),
      ThemeMode::Light => Style::default().fg(Color::Magenta),
    }
  }

  pub fn error(&self) -> Style {
    Style::default().fg(Color::Red)
  }

  pub fn selection(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().bg(Color::DarkGray),
      ThemeMode::Light => Style::default().bg(Color::Gray).fg(Color::Black),
    }
  }

  pub fn bar(&self) -> Style {
    match self.mode {
      ThemeMode::Dark => Style::default().bg(Color::Black),
      ThemeMode::Light => Style::default().bg(Color::White),
    }
  }
}

impl Default for Theme {
  fn default() -> Self {
    Self::new(ThemeMode::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_toggle_alternates() {
    assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
    assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Dark);

    let mut theme = Theme::new(ThemeMode::Dark);
    theme.toggle();
    assert_eq!(theme.mode, ThemeMode::Light);
    theme.toggle();
    assert_eq!(theme.mode, ThemeMode::Dark);
  }

  #[test]
  fn test_label_parse_round_trip() {
    assert_eq!(parse_mode(ThemeMode::Light.label()), Some(ThemeMode::Light));
    assert_eq!(parse_mode(ThemeMode::Dark.label()), Some(ThemeMode::Dark));
    assert_eq!(parse_mode("solarized"), None);
  }

  #[test]
  fn test_mode_parses_from_yaml() {
    let mode: ThemeMode = serde_yaml::from_str("light").unwrap();
    assert_eq!(mode, ThemeMode::Light);
  }
}
