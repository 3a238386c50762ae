use anyhow::Context;
use mungos::mongodb::bson::doc;
use serde::Serialize;

use crate::state;

pub mod check;
pub mod read;
pub mod write;

#[derive(serde::Deserialize)]
struct Variant {
  variant: String,
}

/// Resource URL of one of Warden's own stored resources,
/// eg. `iam/services/library.example.com`.
pub fn iam_url(name: &str) -> String {
  format!("iam/{name}")
}

#[derive(Serialize)]
pub struct HealthResponse {
  pub version: String,
  pub database: bool,
}

pub async fn health()
-> serror::Result<axum::Json<HealthResponse>> {
  state::db_client()
    .db
    .run_command(doc! { "ping": 1 })
    .await
    .context("database ping failed")?;
  Ok(axum::Json(HealthResponse {
    version: format!("v{}", env!("CARGO_PKG_VERSION")),
    database: true,
  }))
}
