use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Page size applied when a list request passes 0.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Standard per page cap. Individual types may raise it
/// (users allow 1000).
pub const MAX_PAGE_SIZE: i64 = 500;

/// The state behind an opaque page token. The filter travels inside
/// the cursor so a caller cannot change it between pages.
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct PageCursor {
  pub page: u64,
  pub page_size: i64,
  #[serde(default)]
  pub filter: String,
}

impl PageCursor {
  pub fn encode(&self) -> String {
    // PageCursor serialization cannot fail
    STANDARD.encode(serde_json::to_string(self).unwrap())
  }

  pub fn decode(token: &str) -> anyhow::Result<PageCursor> {
    let bytes = STANDARD
      .decode(token)
      .context("invalid page token: not base64")?;
    serde_json::from_slice(&bytes)
      .context("invalid page token: unrecognized contents")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cursor_round_trips() {
    let cursor = PageCursor {
      page: 3,
      page_size: 100,
      filter: String::from("parent=services/library.example.com"),
    };
    let decoded = PageCursor::decode(&cursor.encode()).unwrap();
    assert_eq!(decoded, cursor);
  }

  #[test]
  fn rejects_garbage_tokens() {
    assert!(PageCursor::decode("not a token").is_err());
    let bytes = STANDARD.encode("{\"nope\":true}");
    assert!(PageCursor::decode(&bytes).is_err());
  }
}
