use std::time::{Duration, Instant};

/// Default trailing-edge delay for the filter input.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Trailing-edge debouncer for the free-text filter.
///
/// Each keystroke records the latest value and restarts the timer; the
/// value is released by [`poll`](Debouncer::poll) once the input has been
/// quiet for the full delay, so rapid typing never recomputes the
/// filter/sort/page pipeline per keystroke. `poll` is driven by the event
/// loop's tick, which bounds how promptly a settled value is observed.
#[derive(Debug, Clone)]
pub struct Debouncer {
  delay: Duration,
  pending: Option<(String, Instant)>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Record a new value, restarting the quiet period
  pub fn record(&mut self, value: String) {
    self.pending = Some((value, Instant::now()));
  }

  /// Release the pending value if the quiet period has elapsed
  pub fn poll(&mut self) -> Option<String> {
    match &self.pending {
      Some((_, at)) if at.elapsed() >= self.delay => {
        self.pending.take().map(|(value, _)| value)
      }
      _ => None,
    }
  }

  /// Release the pending value immediately (submit skips the wait)
  pub fn flush(&mut self) -> Option<String> {
    self.pending.take().map(|(value, _)| value)
  }
}

impl Default for Debouncer {
  fn default() -> Self {
    Self::new(FILTER_DEBOUNCE)
  }
}
