use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use url::Url;

use crate::api::types::{Todo, User};
use crate::config::Config;

/// Remote source of todos and users.
///
/// Object-safe so the synchronization facade can be exercised against a
/// counting double in tests. Every method is a single attempt - no
/// retries, no timeout beyond the transport default.
#[async_trait]
pub trait TodoApi: Send + Sync {
  /// Fetch the full todo collection.
  async fn fetch_todos(&self) -> Result<Vec<Todo>>;

  /// Fetch the todos owned by one user (server-side filter).
  async fn fetch_todos_by_user(&self, user_id: u64) -> Result<Vec<Todo>>;

  /// Fetch the full user collection.
  async fn fetch_users(&self) -> Result<Vec<User>>;

  /// Fetch a single user by id.
  async fn fetch_user(&self, user_id: u64) -> Result<User>;
}

/// REST client for a JSONPlaceholder-style API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let mut base = Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.api.base_url, e))?;

    // Normalize so join() appends instead of replacing the last segment
    if !base.path().ends_with('/') {
      base.set_path(&format!("{}/", base.path()));
    }

    Ok(Self {
      http: reqwest::Client::new(),
      base,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))
  }
}

/// Turn a single-user response body into a typed record.
///
/// The API answers unknown ids with an empty 200 body, so a payload
/// without an `id` field means the user does not exist.
fn user_from_body(body: Value, user_id: u64) -> Result<User> {
  if body.get("id").and_then(Value::as_u64).is_none() {
    return Err(eyre!("User {} not found", user_id));
  }

  serde_json::from_value(body).map_err(|e| eyre!("Invalid user payload for {}: {}", user_id, e))
}

#[async_trait]
impl TodoApi for ApiClient {
  async fn fetch_todos(&self) -> Result<Vec<Todo>> {
    let url = self.endpoint("todos")?;

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Todo request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Todo request failed: {}", e))?;

    let todos: Vec<Todo> = response
      .json()
      .await
      .map_err(|e| eyre!("Invalid todo payload: {}", e))?;

    Ok(todos)
  }

  async fn fetch_todos_by_user(&self, user_id: u64) -> Result<Vec<Todo>> {
    let url = self.endpoint("todos")?;

    let response = self
      .http
      .get(url)
      .query(&[("userId", user_id)])
      .send()
      .await
      .map_err(|e| eyre!("Todo request for user {} failed: {}", user_id, e))?
      .error_for_status()
      .map_err(|e| eyre!("Todo request for user {} failed: {}", user_id, e))?;

    let todos: Vec<Todo> = response
      .json()
      .await
      .map_err(|e| eyre!("Invalid todo payload for user {}: {}", user_id, e))?;

    Ok(todos)
  }

  async fn fetch_users(&self) -> Result<Vec<User>> {
    let url = self.endpoint("users")?;

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("User request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("User request failed: {}", e))?;

    let users: Vec<User> = response
      .json()
      .await
      .map_err(|e| eyre!("Invalid user payload: {}", e))?;

    Ok(users)
  }

  async fn fetch_user(&self, user_id: u64) -> Result<User> {
    let url = self.endpoint(&format!("users/{}", user_id))?;

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("User request failed: {}", e))?
      .error_for_status()
      .map_err(|_| eyre!("User {} not found", user_id))?;

    let body: Value = response
      .json()
      .await
      .map_err(|e| eyre!("Invalid user payload for {}: {}", user_id, e))?;

    user_from_body(body, user_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;

  fn client_with_base(base_url: &str) -> ApiClient {
    let config = Config {
      api: ApiConfig {
        base_url: base_url.to_string(),
      },
      ..Config::default()
    };
    ApiClient::new(&config).unwrap()
  }

  #[test]
  fn test_endpoint_join() {
    let client = client_with_base("https://example.com");
    assert_eq!(
      client.endpoint("todos").unwrap().as_str(),
      "https://example.com/todos"
    );
  }

  #[test]
  fn test_endpoint_join_preserves_base_path() {
    let client = client_with_base("https://example.com/api/v1");
    assert_eq!(
      client.endpoint("users/3").unwrap().as_str(),
      "https://example.com/api/v1/users/3"
    );
  }

  #[test]
  fn test_user_from_body_rejects_empty_object() {
    let err = user_from_body(serde_json::json!({}), 99).unwrap_err();
    assert!(err.to_string().contains("User 99 not found"));
  }

  #[test]
  fn test_user_from_body_accepts_full_record() {
    let body = serde_json::json!({
      "id": 3,
      "name": "Clementine Bauch",
      "username": "Samantha",
      "email": "Nathan@yesenia.net"
    });
    let user = user_from_body(body, 3).unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.username, "Samantha");
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let config = Config {
      api: ApiConfig {
        base_url: "not a url".to_string(),
      },
      ..Config::default()
    };
    assert!(ApiClient::new(&config).is_err());
  }
}
