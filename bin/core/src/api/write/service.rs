use anyhow::anyhow;
use reqwest::StatusCode;
use resolver_api::Resolve;
use serror::AddStatusCodeError;
use warden_client::{
  api::write::{
    CreateService, CreateServiceResponse, DeleteService,
    DeleteServiceResponse, PurgeService, PurgeServiceResponse,
    UndeleteService, UndeleteServiceResponse, UpdateService,
    UpdateServiceResponse,
  },
  entities::{
    operation::Operation,
    service::{Service, service_name},
  },
};

use crate::{
  api::iam_url,
  auth::authorize,
  reconcile::model::reconcile_model,
  resource::{self, WardenResource},
  validate,
};

use super::WriteArgs;

impl Resolve<WriteArgs> for CreateService {
  #[instrument(name = "CreateService", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<CreateServiceResponse> {
    let CreateService {
      mut service,
      validate_only,
    } = self;

    let mut violations = validate::Violations::new();
    validate::service_spec(&mut violations, &service);
    validate::common_fields(&mut violations, &service);
    violations.into_result()?;

    service.name = service_name(&service.spec.service_id);
    authorize(
      &args.subject,
      "iam/services.create",
      &iam_url(&service.name),
    )
    .await?;

    if validate_only {
      return Ok(Operation::completed(service));
    }

    let service = resource::create::<Service>(service).await?;
    reconcile_model().await?;

    Ok(Operation::completed(service))
  }
}

impl Resolve<WriteArgs> for UpdateService {
  #[instrument(name = "UpdateService", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UpdateServiceResponse> {
    let UpdateService {
      service,
      update_mask,
      validate_only,
    } = self;
    if service.name.is_empty() {
      return Err(
        anyhow!("service.name must name the service to update")
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    authorize(
      &args.subject,
      "iam/services.update",
      &iam_url(&service.name),
    )
    .await?;

    let existing =
      resource::get::<Service>(&service.name).await?;
    let merged = validate::apply_update(
      &existing,
      &service,
      &update_mask,
      Service::IMMUTABLE_FIELDS,
    )?;

    let mut violations = validate::Violations::new();
    validate::service_spec(&mut violations, &merged);
    validate::common_fields(&mut violations, &merged);
    violations.into_result()?;

    if validate_only {
      return Ok(Operation::completed(merged));
    }

    let updated =
      resource::update::<Service, _>(&service.name, |existing| {
        validate::apply_update(
          &existing,
          &service,
          &update_mask,
          Service::IMMUTABLE_FIELDS,
        )
      })
      .await?;
    reconcile_model().await?;

    Ok(Operation::completed(updated))
  }
}

impl Resolve<WriteArgs> for DeleteService {
  #[instrument(name = "DeleteService", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<DeleteServiceResponse> {
    authorize(
      &args.subject,
      "iam/services.delete",
      &iam_url(&self.name),
    )
    .await?;
    if self.validate_only {
      let mut service =
        resource::get::<Service>(&self.name).await?;
      service.delete_time =
        warden_client::entities::warden_timestamp();
      return Ok(Operation::completed(service));
    }
    let service =
      resource::delete::<Service>(&self.name, &self.etag).await?;
    // Drop the deleted service's types from the projected model.
    reconcile_model().await?;
    Ok(Operation::completed(service))
  }
}

impl Resolve<WriteArgs> for UndeleteService {
  #[instrument(name = "UndeleteService", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UndeleteServiceResponse> {
    authorize(
      &args.subject,
      "iam/services.undelete",
      &iam_url(&self.name),
    )
    .await?;
    let service =
      resource::undelete::<Service>(&self.name).await?;
    reconcile_model().await?;
    Ok(Operation::completed(service))
  }
}

impl Resolve<WriteArgs> for PurgeService {
  #[instrument(name = "PurgeService", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<PurgeServiceResponse> {
    authorize(
      &args.subject,
      "iam/services.purge",
      &iam_url(&self.name),
    )
    .await?;
    let existing = resource::get::<Service>(&self.name).await?;
    if !existing.is_deleted() {
      return Err(
        anyhow!(
          "Service {} must be deleted before it can be purged",
          self.name
        )
        .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    let service = resource::purge::<Service>(&self.name).await?;
    reconcile_model().await?;
    Ok(Operation::completed(service))
  }
}
