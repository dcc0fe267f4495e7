use chrono::{DateTime, Local, Utc};

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Checkbox marker for a todo's completion flag
pub fn checkbox(completed: bool) -> &'static str {
  if completed {
    "[x]"
  } else {
    "[ ]"
  }
}

/// Render a cache timestamp in local time for the footer
pub fn format_synced(ts: DateTime<Utc>) -> String {
  ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
