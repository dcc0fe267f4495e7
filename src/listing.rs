//! Pure list shaping: filtering, sorting, paging and stats for todo views.
//!
//! Everything here is deterministic over its inputs so the views can
//! recompute on every render without surprises.

use std::collections::HashSet;

use crate::api::Todo;

/// Todos shown per page.
pub const PAGE_SIZE: usize = 10;

/// Sort order for the todo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
  #[default]
  Id,
  Title,
}

impl SortBy {
  pub fn toggled(self) -> Self {
    match self {
      SortBy::Id => SortBy::Title,
      SortBy::Title => SortBy::Id,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      SortBy::Id => "id",
      SortBy::Title => "title",
    }
  }
}

/// Completion facet of the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionFilter {
  #[default]
  All,
  Completed,
  Pending,
}

impl CompletionFilter {
  pub fn cycled(self) -> Self {
    match self {
      CompletionFilter::All => CompletionFilter::Completed,
      CompletionFilter::Completed => CompletionFilter::Pending,
      CompletionFilter::Pending => CompletionFilter::All,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      CompletionFilter::All => "all",
      CompletionFilter::Completed => "done",
      CompletionFilter::Pending => "pending",
    }
  }

  pub fn matches(&self, todo: &Todo) -> bool {
    match self {
      CompletionFilter::All => true,
      CompletionFilter::Completed => todo.completed,
      CompletionFilter::Pending => !todo.completed,
    }
  }
}

/// Active filters over the todo list. All facets compose with AND.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
  /// Case-insensitive substring match on the title; empty matches all.
  pub text: String,
  /// Restrict to one owner when set.
  pub user: Option<u64>,
  pub completion: CompletionFilter,
}

impl ListFilters {
  pub fn is_active(&self) -> bool {
    !self.text.is_empty() || self.user.is_some() || self.completion != CompletionFilter::All
  }
}

/// Apply the filters, preserving input order.
pub fn filter(todos: &[Todo], filters: &ListFilters) -> Vec<Todo> {
  let needle = filters.text.to_lowercase();

  todos
    .iter()
    .filter(|t| {
      (needle.is_empty() || t.title.to_lowercase().contains(&needle))
        && filters.user.map_or(true, |u| t.user_id == u)
        && filters.completion.matches(t)
    })
    .cloned()
    .collect()
}

/// Sort in place. Title order is case-insensitive, with the id as a
/// tiebreak so equal titles still land in a stable order.
pub fn sort(todos: &mut [Todo], by: SortBy) {
  match by {
    SortBy::Id => todos.sort_by_key(|t| t.id),
    SortBy::Title => todos.sort_by_cached_key(|t| (t.title.to_lowercase(), t.id)),
  }
}

/// Number of pages for a list of `len` todos; an empty list still has one.
pub fn total_pages(len: usize) -> usize {
  len.div_ceil(PAGE_SIZE).max(1)
}

/// Clamp a zero-based page index into range for a list of `len` todos.
pub fn clamp_page(page: usize, len: usize) -> usize {
  page.min(total_pages(len) - 1)
}

/// The slice of todos visible on a zero-based page.
pub fn page_slice(todos: &[Todo], page: usize) -> &[Todo] {
  let start = page * PAGE_SIZE;
  if start >= todos.len() {
    return &[];
  }
  let end = (start + PAGE_SIZE).min(todos.len());
  &todos[start..end]
}

/// Aggregate counters for the stats strip, computed over the full
/// collection rather than the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoStats {
  pub total: usize,
  pub completed: usize,
  pub users: usize,
}

pub fn stats(todos: &[Todo]) -> TodoStats {
  let users: HashSet<u64> = todos.iter().map(|t| t.user_id).collect();

  TodoStats {
    total: todos.len(),
    completed: todos.iter().filter(|t| t.completed).count(),
    users: users.len(),
  }
}
