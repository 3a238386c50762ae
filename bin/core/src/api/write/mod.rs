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
use warden_client::api::write::*;

use crate::auth::{AuthedSubject, auth_request};

use super::Variant;

mod policy;
mod role;
mod service;
mod tenant;
mod user;

pub struct WriteArgs {
  pub subject: String,
}

#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EnumVariants,
)]
#[variant_derive(Debug)]
#[args(WriteArgs)]
#[response(Response)]
#[error(serror::Error)]
#[serde(tag = "type", content = "params")]
pub enum WriteRequest {
  // ==== SERVICE ====
  CreateService(CreateService),
  UpdateService(UpdateService),
  DeleteService(DeleteService),
  UndeleteService(UndeleteService),
  PurgeService(PurgeService),

  // ==== ROLE ====
  CreateRole(CreateRole),
  UpdateRole(UpdateRole),
  DeleteRole(DeleteRole),
  UndeleteRole(UndeleteRole),
  PurgeRole(PurgeRole),

  // ==== POLICY ====
  SetIamPolicy(SetIamPolicy),

  // ==== USER ====
  CreateUser(CreateUser),
  UpdateUser(UpdateUser),
  DeleteUser(DeleteUser),
  UndeleteUser(UndeleteUser),
  PurgeUser(PurgeUser),
  SetUserProviderId(SetUserProviderId),

  // ==== TENANCY ====
  CreateOrganization(CreateOrganization),
  UpdateOrganization(UpdateOrganization),
  DeleteOrganization(DeleteOrganization),
  CreateProject(CreateProject),
  UpdateProject(UpdateProject),
  DeleteProject(DeleteProject),
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
  let req: WriteRequest = serde_json::from_value(json!({
    "type": variant,
    "params": params,
  }))?;
  handler(subject, Json(req)).await
}

async fn handler(
  Extension(AuthedSubject(subject)): Extension<AuthedSubject>,
  Json(request): Json<WriteRequest>,
) -> serror::Result<axum::response::Response> {
  let req_id = Uuid::new_v4();

  let res = tokio::spawn(task(req_id, request, subject))
    .await
    .context("failure in spawned task");

  res?
}

#[instrument(
  name = "WriteRequest",
  skip(request, subject),
  fields(
    subject = subject,
    request = format!("{:?}", request.extract_variant())
  )
)]
async fn task(
  req_id: Uuid,
  request: WriteRequest,
  subject: String,
) -> serror::Result<axum::response::Response> {
  info!("/write request | subject: {subject}");

  let timer = Instant::now();

  let res = request.resolve(&WriteArgs { subject }).await;

  if let Err(e) = &res {
    warn!("/write request {req_id} error: {:#}", e.error);
  }

  let elapsed = timer.elapsed();
  debug!("/write request {req_id} | resolve time: {elapsed:?}");

  res.map(|res| res.0)
}
