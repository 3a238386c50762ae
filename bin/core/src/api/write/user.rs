use anyhow::anyhow;
use reqwest::StatusCode;
use resolver_api::Resolve;
use serror::AddStatusCodeError;
use uuid::Uuid;
use warden_client::{
  api::write::{
    CreateUser, CreateUserResponse, DeleteUser, DeleteUserResponse,
    PurgeUser, PurgeUserResponse, SetUserProviderId,
    SetUserProviderIdResponse, UndeleteUser, UndeleteUserResponse,
    UpdateUser, UpdateUserResponse,
  },
  entities::{
    operation::Operation,
    user::{User, user_name},
  },
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, WardenResource},
  validate,
};

use super::WriteArgs;

fn validate_user(user: &User) -> serror::Result<()> {
  let mut violations = validate::Violations::new();
  if user.spec.email.is_empty()
    || !user.spec.email.contains('@')
  {
    violations.push(
      "spec.email",
      format!("'{}' is not a valid email", user.spec.email),
    );
  }
  validate::common_fields(&mut violations, user);
  violations.into_result()
}

impl Resolve<WriteArgs> for CreateUser {
  #[instrument(name = "CreateUser", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<CreateUserResponse> {
    let CreateUser {
      mut user,
      validate_only,
    } = self;

    validate_user(&user)?;
    if resource::user_by_email(&user.spec.email)
      .await?
      .is_some()
    {
      return Err(
        anyhow!(
          "a user with email '{}' already exists",
          user.spec.email
        )
        .status_code(StatusCode::CONFLICT),
      );
    }

    user.name = user_name(&Uuid::new_v4().to_string());
    authorize(
      &args.subject,
      "iam/users.create",
      &iam_url(&user.name),
    )
    .await?;

    if validate_only {
      return Ok(Operation::completed(user));
    }

    let user = resource::create::<User>(user).await?;
    Ok(Operation::completed(user))
  }
}

impl Resolve<WriteArgs> for UpdateUser {
  #[instrument(name = "UpdateUser", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UpdateUserResponse> {
    let UpdateUser {
      user,
      update_mask,
      validate_only,
    } = self;
    if user.name.is_empty() {
      return Err(
        anyhow!("user.name must name the user to update")
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    authorize(
      &args.subject,
      "iam/users.update",
      &iam_url(&user.name),
    )
    .await?;

    let existing = resource::get::<User>(&user.name).await?;
    let merged = validate::apply_update(
      &existing,
      &user,
      &update_mask,
      User::IMMUTABLE_FIELDS,
    )?;
    validate_user(&merged)?;

    if validate_only {
      return Ok(Operation::completed(merged));
    }

    let updated =
      resource::update::<User, _>(&user.name, |existing| {
        validate::apply_update(
          &existing,
          &user,
          &update_mask,
          User::IMMUTABLE_FIELDS,
        )
      })
      .await?;
    Ok(Operation::completed(updated))
  }
}

impl Resolve<WriteArgs> for DeleteUser {
  #[instrument(name = "DeleteUser", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<DeleteUserResponse> {
    authorize(
      &args.subject,
      "iam/users.delete",
      &iam_url(&self.name),
    )
    .await?;
    if self.validate_only {
      return Ok(Operation::completed(
        resource::get::<User>(&self.name).await?,
      ));
    }
    // Soft deleted users stop resolving as subjects immediately;
    // their projected bindings go stale rather than granting.
    let user =
      resource::delete::<User>(&self.name, &self.etag).await?;
    Ok(Operation::completed(user))
  }
}

impl Resolve<WriteArgs> for UndeleteUser {
  #[instrument(name = "UndeleteUser", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UndeleteUserResponse> {
    authorize(
      &args.subject,
      "iam/users.undelete",
      &iam_url(&self.name),
    )
    .await?;
    let user = resource::undelete::<User>(&self.name).await?;
    Ok(Operation::completed(user))
  }
}

impl Resolve<WriteArgs> for PurgeUser {
  #[instrument(name = "PurgeUser", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<PurgeUserResponse> {
    authorize(
      &args.subject,
      "iam/users.purge",
      &iam_url(&self.name),
    )
    .await?;
    let existing = resource::get::<User>(&self.name).await?;
    if !existing.is_deleted() {
      return Err(
        anyhow!(
          "User {} must be deleted before it can be purged",
          self.name
        )
        .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    let user = resource::purge::<User>(&self.name).await?;
    Ok(Operation::completed(user))
  }
}

impl Resolve<WriteArgs> for SetUserProviderId {
  #[instrument(name = "SetUserProviderId", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<SetUserProviderIdResponse> {
    authorize(
      &args.subject,
      "iam/users.setProviderId",
      &iam_url(&self.name),
    )
    .await?;
    let provider_id = self.provider_id;
    let user =
      resource::update::<User, _>(&self.name, move |mut user| {
        user.spec.provider_id = provider_id;
        Ok(user)
      })
      .await?;
    Ok(Operation::completed(user))
  }
}
