use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: breadcrumb on the left, flash message or the
/// view's status line on the right
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  theme: &Theme,
  breadcrumb: &[String],
  status: &str,
  flash: Option<&str>,
) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", theme.dim()));
    }

    let style = if i == breadcrumb.len() - 1 {
      theme.brand()
    } else {
      theme.text()
    };
    spans.push(Span::styled(part.clone(), style));
  }

  // Right side: a flash message wins over the status line
  let (right, right_style) = match flash {
    Some(msg) => (format!("{} ", msg), theme.emphasis()),
    None => (format!("{} ", status), theme.dim()),
  };

  let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let gap = (area.width as usize)
    .saturating_sub(left_width)
    .saturating_sub(right.chars().count());
  spans.push(Span::raw(" ".repeat(gap)));
  spans.push(Span::styled(right, right_style));

  let paragraph = Paragraph::new(Line::from(spans)).style(theme.bar());
  frame.render_widget(paragraph, area);
}
