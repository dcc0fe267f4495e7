use serde::{Deserialize, Serialize};

/// A single todo item. Wire format and domain type are the same flat
/// record; the remote API names fields in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
  pub id: u64,
  pub user_id: u64,
  pub title: String,
  pub completed: bool,
}

/// A user who owns todos. Read-only on the client; kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub website: String,
}

impl User {
  /// Initials for the avatar badge ("Leanne Graham" -> "LG")
  pub fn initials(&self) -> String {
    self
      .name
      .split_whitespace()
      .filter_map(|part| part.chars().next())
      .map(|c| c.to_ascii_uppercase())
      .collect()
  }
}
