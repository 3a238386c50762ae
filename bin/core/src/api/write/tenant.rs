use anyhow::anyhow;
use reqwest::StatusCode;
use resolver_api::Resolve;
use serror::AddStatusCodeError;
use warden_client::{
  api::write::{
    CreateOrganization, CreateOrganizationResponse, CreateProject,
    CreateProjectResponse, DeleteOrganization,
    DeleteOrganizationResponse, DeleteProject,
    DeleteProjectResponse, UpdateOrganization,
    UpdateOrganizationResponse, UpdateProject,
    UpdateProjectResponse,
  },
  entities::{
    operation::Operation,
    tenant::{
      Organization, Project, organization_name, project_name,
    },
  },
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, WardenResource},
  validate,
};

use super::WriteArgs;

impl Resolve<WriteArgs> for CreateOrganization {
  #[instrument(name = "CreateOrganization", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<CreateOrganizationResponse> {
    let CreateOrganization {
      mut organization,
      validate_only,
    } = self;

    let mut violations = validate::Violations::new();
    validate::dns_label(
      &mut violations,
      "spec.org_id",
      &organization.spec.org_id,
    );
    validate::common_fields(&mut violations, &organization);
    violations.into_result()?;

    organization.name =
      organization_name(&organization.spec.org_id);
    authorize(
      &args.subject,
      "iam/organizations.create",
      &iam_url(&organization.name),
    )
    .await?;

    if validate_only {
      return Ok(Operation::completed(organization));
    }

    let organization =
      resource::create::<Organization>(organization).await?;
    Ok(Operation::completed(organization))
  }
}

impl Resolve<WriteArgs> for UpdateOrganization {
  #[instrument(name = "UpdateOrganization", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UpdateOrganizationResponse> {
    let UpdateOrganization {
      organization,
      update_mask,
      validate_only,
    } = self;
    if organization.name.is_empty() {
      return Err(
        anyhow!(
          "organization.name must name the organization to update"
        )
        .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    authorize(
      &args.subject,
      "iam/organizations.update",
      &iam_url(&organization.name),
    )
    .await?;

    let existing =
      resource::get::<Organization>(&organization.name).await?;
    let merged = validate::apply_update(
      &existing,
      &organization,
      &update_mask,
      Organization::IMMUTABLE_FIELDS,
    )?;
    let mut violations = validate::Violations::new();
    validate::common_fields(&mut violations, &merged);
    violations.into_result()?;

    if validate_only {
      return Ok(Operation::completed(merged));
    }

    let updated = resource::update::<Organization, _>(
      &organization.name,
      |existing| {
        validate::apply_update(
          &existing,
          &organization,
          &update_mask,
          Organization::IMMUTABLE_FIELDS,
        )
      },
    )
    .await?;
    Ok(Operation::completed(updated))
  }
}

impl Resolve<WriteArgs> for DeleteOrganization {
  #[instrument(name = "DeleteOrganization", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<DeleteOrganizationResponse> {
    authorize(
      &args.subject,
      "iam/organizations.delete",
      &iam_url(&self.name),
    )
    .await?;
    if self.validate_only {
      return Ok(Operation::completed(
        resource::get::<Organization>(&self.name).await?,
      ));
    }
    let organization =
      resource::delete::<Organization>(&self.name, &self.etag)
        .await?;
    Ok(Operation::completed(organization))
  }
}

impl Resolve<WriteArgs> for CreateProject {
  #[instrument(name = "CreateProject", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<CreateProjectResponse> {
    let CreateProject {
      parent,
      mut project,
      validate_only,
    } = self;

    // Projects hang off an existing organization.
    resource::get::<Organization>(&parent).await?;

    let mut violations = validate::Violations::new();
    validate::dns_label(
      &mut violations,
      "spec.project_id",
      &project.spec.project_id,
    );
    validate::common_fields(&mut violations, &project);
    violations.into_result()?;

    project.name = project_name(&project.spec.project_id);
    project.parent = parent;
    authorize(
      &args.subject,
      "iam/projects.create",
      &iam_url(&project.name),
    )
    .await?;

    if validate_only {
      return Ok(Operation::completed(project));
    }

    let project = resource::create::<Project>(project).await?;
    Ok(Operation::completed(project))
  }
}

impl Resolve<WriteArgs> for UpdateProject {
  #[instrument(name = "UpdateProject", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<UpdateProjectResponse> {
    let UpdateProject {
      project,
      update_mask,
      validate_only,
    } = self;
    if project.name.is_empty() {
      return Err(
        anyhow!("project.name must name the project to update")
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    authorize(
      &args.subject,
      "iam/projects.update",
      &iam_url(&project.name),
    )
    .await?;

    let existing =
      resource::get::<Project>(&project.name).await?;
    let merged = validate::apply_update(
      &existing,
      &project,
      &update_mask,
      Project::IMMUTABLE_FIELDS,
    )?;
    let mut violations = validate::Violations::new();
    validate::common_fields(&mut violations, &merged);
    violations.into_result()?;

    if validate_only {
      return Ok(Operation::completed(merged));
    }

    let updated =
      resource::update::<Project, _>(&project.name, |existing| {
        validate::apply_update(
          &existing,
          &project,
          &update_mask,
          Project::IMMUTABLE_FIELDS,
        )
      })
      .await?;
    Ok(Operation::completed(updated))
  }
}

impl Resolve<WriteArgs> for DeleteProject {
  #[instrument(name = "DeleteProject", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<DeleteProjectResponse> {
    authorize(
      &args.subject,
      "iam/projects.delete",
      &iam_url(&self.name),
    )
    .await?;
    if self.validate_only {
      return Ok(Operation::completed(
        resource::get::<Project>(&self.name).await?,
      ));
    }
    let project =
      resource::delete::<Project>(&self.name, &self.etag).await?;
    Ok(Operation::completed(project))
  }
}
