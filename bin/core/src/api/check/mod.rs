use std::time::Instant;

use anyhow::Context;
use axum::{
  Extension, Router, extract::Path, middleware, routing::post,
};
use derive_variants::{EnumVariants, ExtractVariant};
use resolver_api::Resolve;
use response::Response;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serror::Json;
use typeshare::typeshare;
use uuid::Uuid;
use warden_client::api::check::{
  CheckAccess, CheckAccessResponse,
};

use crate::{
  auth::{AuthedSubject, auth_request},
  check,
};

use super::Variant;

pub struct CheckArgs {
  /// The authenticated caller, which may differ from the subject
  /// being asked about.
  pub subject: String,
}

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(CheckArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum CheckRequest {
  CheckAccess(CheckAccess),
}

pub fn router() -> Router {
  Router::new()
    .route("/", post(handler))
    .route("/{variant}", post(variant_handler))
    .layer(middleware::from_fn(auth_request))
}

async fn variant_handler(
  subject: Extension<AuthedSubject>,
  Path(Variant { variant }): Path<Variant>,
  Json(params): Json<serde_json::Value>,
) -> serror::Result<axum::response::Response> {
  let req: CheckRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(subject, Json(req)).await
}

async fn handler(
  Extension(AuthedSubject(subject)): Extension<AuthedSubject>,
  Json(request): Json<CheckRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();

  let res = tokio::spawn(task(req_id, request, subject))
    .await
    .context("failure in spawned task");

  res?
}

#[instrument(
  name = "CheckRequest",
  skip(request, subject),
  fields(
    subject = subject,
    request = format!("{:?}", request.extract_variant())
  )
)]
async fn task(
  req_id: Uuid,
  request: CheckRequest,
  subject: String,
) -> serror::Result<axum::response::Response> {
  let timer = Instant::now();

  let res = request.resolve(&CheckArgs { subject }).await;

  if let Err(e) = &res {
    warn!("/check request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!("/check request {req_id} | resolve time: {elapsed:?}");

  res.map(|res| res.0)
}

impl Resolve<CheckArgs> for CheckAccess {
  async fn resolve(
    self,
    _: &CheckArgs,
  ) -> serror::Result<CheckAccessResponse> {
    let outcome = check::engine()
      .check_access(
        &self.subject,
        &self.permission,
        &self.resource,
        &self.context,
        "CheckAccess",
      )
      .await?;
    Ok(CheckAccessResponse {
      allowed: outcome.allowed,
    })
  }
}
