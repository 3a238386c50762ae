//! # Warden client
//!
//! Typed client for the Warden IAM service. Requests are the same
//! structs the server resolves, posted as `{ type, params }`
//! envelopes to `/read`, `/write` and `/check`.
//!
//! ```ignore
//! let client = WardenClient::new("http://localhost:7440", token);
//! let allowed = client
//!   .check(CheckAccess {
//!     subject: String::from("user:renter@example.com"),
//!     permission: String::from("library.example.com/books.checkout"),
//!     resource: String::from(
//!       "library.example.com/branches/central-park/books/alice",
//!     ),
//!     context: Default::default(),
//!   })
//!   .await?
//!   .allowed;
//! ```

use anyhow::Context;
use resolver_api::HasResponse;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use serror::deserialize_error;

pub mod api;
pub mod entities;

use crate::api::{
  check::WardenCheckRequest, read::WardenReadRequest,
  write::WardenWriteRequest,
};

#[derive(Clone)]
pub struct WardenClient {
  reqwest: reqwest::Client,
  address: String,
  token: String,
}

impl WardenClient {
  /// Connect to a Warden Core server. `token` may be empty when the
  /// deployment extracts subjects from a trusted proxy header.
  pub fn new(
    address: impl Into<String>,
    token: impl Into<String>,
  ) -> WardenClient {
    WardenClient {
      reqwest: Default::default(),
      address: address.into().trim_end_matches('/').to_string(),
      token: token.into(),
    }
  }

  pub async fn read<T: WardenReadRequest>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: Serialize,
    T::Response: DeserializeOwned,
  {
    self.post("/read", request).await
  }

  pub async fn write<T: WardenWriteRequest>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: Serialize,
    T::Response: DeserializeOwned,
  {
    self.post("/write", request).await
  }

  pub async fn check<T: WardenCheckRequest>(
    &self,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T: Serialize,
    T::Response: DeserializeOwned,
  {
    self.post("/check", request).await
  }

  async fn post<T: HasResponse + Serialize>(
    &self,
    endpoint: &str,
    request: T,
  ) -> anyhow::Result<T::Response>
  where
    T::Response: DeserializeOwned,
  {
    let mut req = self
      .reqwest
      .post(format!("{}{endpoint}", self.address))
      .json(&json!({
        "type": T::req_type(),
        "params": request,
      }));
    if !self.token.is_empty() {
      req =
        req.header("authorization", format!("Bearer {}", self.token));
    }
    let res =
      req.send().await.context("failed to reach warden core")?;
    let status = res.status();
    if status.is_success() {
      res.json().await.with_context(|| {
        format!(
          "failed to parse response to {} call",
          T::req_type()
        )
      })
    } else {
      let text = res
        .text()
        .await
        .context("failed to read error response body")?;
      Err(
        deserialize_error(text)
          .context(format!("status: {status}")),
      )
    }
  }
}
