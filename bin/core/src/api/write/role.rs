use anyhow::anyhow;
use reqwest::StatusCode;
use resolver_api::Resolve;
use serror::AddStatusCodeError;
use warden_client::{
  api::write::{
    CreateRole, CreateRoleResponse, DeleteRole, DeleteRoleResponse,
    PurgeRole, PurgeRoleResponse, UndeleteRole,
    UndeleteRoleResponse, UpdateRole, UpdateRoleResponse,
  },
  entities::{
    operation::Operation,
    role::{Role, role_name},
    service::Service,
  },
};

use crate::{
  api::iam_url,
  auth::authorize,
  reconcile::role::{DbRoleSource, cascade_role},
  resource::{self, WardenResource},
  state, validate,
};

use super::WriteArgs;

async fn validate_role_spec(
  role: &Role,
) -> serror::Result<()> {
  let mut violations = validate::Violations::new();
  validate::dns_label(
    &mut violations,
    "spec.role_id",
    &role.spec.role_id,
  );
  validate::common_fields(&mut violations, role);
  validate::permissions_exist(
    state::schema_registry().source(),
    &mut violations,
    "spec.included_permissions",
    &role.spec.included_permissions,
  )
  .await?;
  for (i, inherited) in
    role.spec.inherited_roles.iter().enumerate()
  {
    let missing = resource::get_optional::<Role>(inherited)
      .await?
      .filter(|role| !role.is_deleted())
      .is_none();
    if missing {
      violations.push(
        format!("spec.inherited_roles[{i}]"),
        format!("unknown role '{inherited}'"),
      );
    }
  }
  violations.into_result()
}

impl Resolve<WriteArgs> for CreateRole {
  #[instrument(name = "CreateRole", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<CreateRoleResponse> {
    let CreateRole {
      parent,
      mut role,
      validate_only,
    } = self;

    // The parent service must exist before roles can hang off it.
    resource::get::<Service>(&parent).await?;
    validate_role_spec(&role).await?;

    role.name = role_name(&parent, &role.spec.role_id);
    role.parent = parent;
    authorize(
      &args.subject,
      "iam/roles.create",
      &iam_url(&role.name),
    )
    .await?;

    if validate_only {
      return Ok(Operation::completed(role));
    }

    let role = resource::create::<Role>(role).await?;
    cascade_role(
      &DbRoleSource,
      state::relationship_store(),
      &role,
    )
    .await?;

    Ok(Operation::completed(role))
  }
}

impl Resolve<WriteArgs> for UpdateRole {
  #[instrument(name = "UpdateRole", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UpdateRoleResponse> {
    let UpdateRole {
      role,
      update_mask,
      validate_only,
    } = self;
    if role.name.is_empty() {
      return Err(
        anyhow!("role.name must name the role to update")
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    authorize(
      &args.subject,
      "iam/roles.update",
      &iam_url(&role.name),
    )
    .await?;

    let existing = resource::get::<Role>(&role.name).await?;
    let merged = validate::apply_update(
      &existing,
      &role,
      &update_mask,
      Role::IMMUTABLE_FIELDS,
    )?;
    validate_role_spec(&merged).await?;

    if validate_only {
      return Ok(Operation::completed(merged));
    }

    let updated =
      resource::update::<Role, _>(&role.name, |existing| {
        validate::apply_update(
          &existing,
          &role,
          &update_mask,
          Role::IMMUTABLE_FIELDS,
        )
      })
      .await?;
    // The closure of this role changed, so every role inheriting it
    // reprojects too.
    cascade_role(
      &DbRoleSource,
      state::relationship_store(),
      &updated,
    )
    .await?;

    Ok(Operation::completed(updated))
  }
}

impl Resolve<WriteArgs> for DeleteRole {
  #[instrument(name = "DeleteRole", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<DeleteRoleResponse> {
    authorize(
      &args.subject,
      "iam/roles.delete",
      &iam_url(&self.name),
    )
    .await?;
    if let Some(referencer) =
      resource::role_is_referenced(&self.name).await?
    {
      return Err(
        anyhow!(
          "Role {} is still referenced: {referencer}",
          self.name
        )
        .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    if self.validate_only {
      return Ok(Operation::completed(
        resource::get::<Role>(&self.name).await?,
      ));
    }
    let role =
      resource::delete::<Role>(&self.name, &self.etag).await?;
    // Deleted roles project an empty closure, clearing their tuples.
    cascade_role(&DbRoleSource, state::relationship_store(), &role)
      .await?;
    Ok(Operation::completed(role))
  }
}

impl Resolve<WriteArgs> for UndeleteRole {
  #[instrument(name = "UndeleteRole", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UndeleteRoleResponse> {
    authorize(
      &args.subject,
      "iam/roles.undelete",
      &iam_url(&self.name),
    )
    .await?;
    let role = resource::undelete::<Role>(&self.name).await?;
    cascade_role(&DbRoleSource, state::relationship_store(), &role)
      .await?;
    Ok(Operation::completed(role))
  }
}

impl Resolve<WriteArgs> for PurgeRole {
  #[instrument(name = "PurgeRole", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<PurgeRoleResponse> {
    authorize(
      &args.subject,
      "iam/roles.purge",
      &iam_url(&self.name),
    )
    .await?;
    let existing = resource::get::<Role>(&self.name).await?;
    if !existing.is_deleted() {
      return Err(
        anyhow!(
          "Role {} must be deleted before it can be purged",
          self.name
        )
        .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    let role = resource::purge::<Role>(&self.name).await?;
    Ok(Operation::completed(role))
  }
}
