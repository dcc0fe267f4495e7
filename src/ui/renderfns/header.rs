use crate::theme::Theme;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, API host and the active view's shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  theme: &Theme,
  base_url: &str,
  shortcuts: &[ShortcutInfo],
) {
  let mut spans = vec![
    Span::styled(" t9s ", theme.brand()),
    Span::styled("│", theme.dim()),
    Span::styled(format!(" {} ", extract_domain(base_url)), theme.text()),
    Span::raw("  "),
  ];

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);

  for shortcut in sorted.iter().take(6) {
    spans.push(Span::styled(format!("<{}>", shortcut.key), theme.accent()));
    spans.push(Span::styled(format!(" {}", shortcut.label), theme.dim()));
    spans.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(theme.bar());
  frame.render_widget(paragraph, area);
}

/// Extract the host from the API base URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(
      extract_domain("https://jsonplaceholder.typicode.com"),
      "jsonplaceholder.typicode.com"
    );
    assert_eq!(
      extract_domain("https://api.example.com/v1/"),
      "api.example.com"
    );
    assert_eq!(extract_domain("http://localhost:3000"), "localhost:3000");
  }
}
