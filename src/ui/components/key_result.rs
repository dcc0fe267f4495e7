/// How a component responded to a key event.
///
/// Components report back to their parent view in one of three ways: they
/// consumed the key, they consumed it and produced an event the parent must
/// act on, or they ignored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try the next handler
  NotHandled,
}
