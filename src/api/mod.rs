pub mod client;
pub mod types;

pub use client::{ApiClient, TodoApi};
pub use types::{Todo, User};
