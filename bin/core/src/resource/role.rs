use anyhow::Context;
use database::Stored;
use mungos::{
  find::find_collect,
  mongodb::{Collection, bson::doc},
};
use warden_client::entities::role::{Role, RoleSpec};

use crate::state::db_client;

use super::WardenResource;

impl WardenResource for Role {
  type Spec = RoleSpec;

  fn kind() -> &'static str {
    "Role"
  }

  fn coll() -> &'static Collection<Stored<Role>> {
    &db_client().roles
  }

  const IMMUTABLE_FIELDS: &'static [&'static str] =
    &["spec.role_id"];

  const PARENT_TYPE: Option<&'static str> = Some("iam/Service");
}

/// All live roles which directly inherit from `role_name`.
pub async fn roles_inheriting(
  role_name: &str,
) -> serror::Result<Vec<Role>> {
  let roles = find_collect(
    Role::coll(),
    doc! {
      "data.value.spec.inherited_roles": role_name,
      "data.value.delete_time": 0_i64,
    },
    None,
  )
  .await
  .context("failed to query db for inheriting roles")?;
  Ok(roles.into_iter().map(Stored::into_inner).collect())
}

/// Whether any live policy binding or live role still references
/// `role_name`. Returns a description of the first referencer for
/// the error message.
pub async fn role_is_referenced(
  role_name: &str,
) -> serror::Result<Option<String>> {
  let policy = db_client()
    .policies
    .find_one(doc! {
      "data.value.spec.bindings.role": role_name,
      "data.value.delete_time": 0_i64,
    })
    .await
    .context("failed to query db for policies binding role")?;
  if let Some(policy) = policy {
    return Ok(Some(format!(
      "policy on '{}' binds it",
      policy.name
    )));
  }
  let inheritor = Role::coll()
    .find_one(doc! {
      "data.value.spec.inherited_roles": role_name,
      "data.value.delete_time": 0_i64,
    })
    .await
    .context("failed to query db for inheriting roles")?;
  if let Some(inheritor) = inheritor {
    return Ok(Some(format!(
      "role '{}' inherits from it",
      inheritor.name
    )));
  }
  Ok(None)
}
