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
use warden_client::api::read::*;

use crate::auth::{AuthedSubject, auth_request};

use super::Variant;

mod policy;
mod role;
mod service;
mod tenant;
mod user;

pub struct ReadArgs {
  pub subject: String,
}

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(ReadArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum ReadRequest {
  GetVersion(GetVersion),

  // ==== SERVICE ====
  GetService(GetService),
  ListServices(ListServices),

  // ==== ROLE ====
  GetRole(GetRole),
  ListRoles(ListRoles),

  // ==== POLICY ====
  GetIamPolicy(GetIamPolicy),

  // ==== USER ====
  GetUser(GetUser),
  ListUsers(ListUsers),

  // ==== TENANCY ====
  GetOrganization(GetOrganization),
  ListOrganizations(ListOrganizations),
  GetProject(GetProject),
  ListProjects(ListProjects),
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
  let req: ReadRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(subject, Json(req)).await
}

async fn handler(
  Extension(AuthedSubject(subject)): Extension<AuthedSubject>,
  Json(request): Json<ReadRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();

  let res = tokio::spawn(task(req_id, request, subject))
    .await
    .context("failure in spawned task");

  res?
}

#[instrument(
  name = "ReadRequest",
  skip(request, subject),
  fields(
    subject = subject,
    request = format!("{:?}", request.extract_variant())
  )
)]
async fn task(
  req_id: Uuid,
  request: ReadRequest,
  subject: String,
) -> serror::Result<axum::response::Response> {
  let timer = Instant::now();

  let res = request.resolve(&ReadArgs { subject }).await;

  if let Err(e) = &res {
    warn!("/read request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!("/read request {req_id} | resolve time: {elapsed:?}");

  res.map(|res| res.0)
}
