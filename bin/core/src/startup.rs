use anyhow::Context;
use database::Stored;
use mungos::{find::find_collect, mongodb::bson::doc};
use warden_client::entities::{
  role::Role,
  service::{Service, ResourceDef, ServiceSpec},
};

use crate::{
  reconcile::{
    model::reconcile_model,
    role::{DbRoleSource, project_role},
  },
  resource::{self, WardenResource},
  state,
};

/// Seed the builtin `iam` service and converge every projection, so
/// a restored database answers checks correctly before the first
/// write arrives.
pub async fn on_startup() {
  if let Err(e) = ensure_iam_service().await {
    panic!("failed to seed the builtin iam service | {:#}", e.error);
  }
  if let Err(e) = reconcile_model().await {
    panic!(
      "failed to project the authorization model | {:#}",
      e.error
    );
  }
  if let Err(e) = project_all_roles().await {
    panic!("failed to project role closures | {:#}", e.error);
  }
}

async fn ensure_iam_service() -> serror::Result<()> {
  let desired = builtin_iam_service();
  match resource::get_optional::<Service>(&desired.name).await? {
    None => {
      info!("creating builtin iam service");
      resource::create::<Service>(desired).await?;
    }
    Some(existing)
      if existing.spec != desired.spec
        || existing.is_deleted() =>
    {
      info!("updating builtin iam service declaration");
      let name = desired.name.clone();
      let spec = desired.spec;
      resource::update::<Service, _>(&name, move |mut existing| {
        existing.spec = spec;
        existing.delete_time = 0;
        Ok(existing)
      })
      .await?;
    }
    Some(_) => {}
  }
  Ok(())
}

async fn project_all_roles() -> serror::Result<()> {
  let roles = find_collect(
    Role::coll(),
    doc! { "data.value.delete_time": 0_i64 },
    None,
  )
  .await
  .context("failed to pull roles for startup projection")?;
  for role in roles {
    project_role(
      &DbRoleSource,
      state::relationship_store(),
      &role.into_inner(),
    )
    .await?;
  }
  Ok(())
}

/// Warden's own surface, declared like any other service so its
/// resources are checkable through the same engine.
fn builtin_iam_service() -> Service {
  let crud = ["create", "get", "list", "update", "delete"];
  let lifecycled = [
    "create", "get", "list", "update", "delete", "undelete",
    "purge",
  ];
  Service {
    name: String::from("services/iam"),
    display_name: String::from("Warden IAM"),
    description: String::from(
      "Builtin service declaring Warden's own resource types",
    ),
    spec: ServiceSpec {
      service_id: String::from("iam"),
      resources: vec![
        ResourceDef {
          resource_type: String::from("iam/Service"),
          singular: String::from("service"),
          plural: String::from("services"),
          permissions: lifecycled.map(String::from).into(),
          resource_name_patterns: vec![String::from(
            "services/{service}",
          )],
          parent_resources: vec![],
        },
        ResourceDef {
          resource_type: String::from("iam/Role"),
          singular: String::from("role"),
          plural: String::from("roles"),
          permissions: [
            "create", "get", "list", "update", "delete",
            "undelete", "purge", "use",
          ]
          .map(String::from)
          .into(),
          resource_name_patterns: vec![String::from(
            "services/{service}/roles/{role}",
          )],
          parent_resources: vec![String::from("iam/Service")],
        },
        ResourceDef {
          resource_type: String::from("iam/Policy"),
          singular: String::from("policy"),
          plural: String::from("policies"),
          permissions: ["get", "set"].map(String::from).into(),
          resource_name_patterns: vec![],
          parent_resources: vec![],
        },
        ResourceDef {
          resource_type: String::from("iam/User"),
          singular: String::from("user"),
          plural: String::from("users"),
          permissions: [
            "create",
            "get",
            "list",
            "update",
            "delete",
            "undelete",
            "purge",
            "setProviderId",
          ]
          .map(String::from)
          .into(),
          resource_name_patterns: vec![String::from(
            "users/{user}",
          )],
          parent_resources: vec![],
        },
        ResourceDef {
          resource_type: String::from("iam/Organization"),
          singular: String::from("organization"),
          plural: String::from("organizations"),
          permissions: crud.map(String::from).into(),
          resource_name_patterns: vec![String::from(
            "organizations/{organization}",
          )],
          parent_resources: vec![],
        },
        ResourceDef {
          resource_type: String::from("iam/Project"),
          singular: String::from("project"),
          plural: String::from("projects"),
          permissions: crud.map(String::from).into(),
          resource_name_patterns: vec![String::from(
            "projects/{project}",
          )],
          parent_resources: vec![String::from(
            "iam/Organization",
          )],
        },
      ],
    },
    ..Default::default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_service_declares_interceptor_permissions() {
    let service = builtin_iam_service();
    let permissions = service.spec.qualified_permissions();
    for needed in [
      "iam/services.create",
      "iam/roles.use",
      "iam/policies.set",
      "iam/users.setProviderId",
      "iam/projects.delete",
    ] {
      assert!(
        permissions.iter().any(|p| p == needed),
        "missing {needed}"
      );
    }
    for def in &service.spec.resources {
      assert!(
        def.resource_type.starts_with("iam/"),
        "type {} must be owned by iam",
        def.resource_type
      );
    }
  }
}
