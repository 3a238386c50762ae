use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{
  operation::Operation,
  tenant::{Organization, Project},
};

use super::WardenWriteRequest;

/// Create an Organization named `organizations/{spec.org_id}`.
/// Response: [Operation]<[Organization]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(CreateOrganizationResponse)]
#[error(serror::Error)]
pub struct CreateOrganization {
  pub organization: Organization,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type CreateOrganizationResponse = Operation<Organization>;

//

/// Update an Organization. Response: [Operation]<[Organization]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UpdateOrganizationResponse)]
#[error(serror::Error)]
pub struct UpdateOrganization {
  pub organization: Organization,
  #[serde(default)]
  pub update_mask: Vec<String>,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type UpdateOrganizationResponse = Operation<Organization>;

//

/// Soft delete an Organization.
/// Response: [Operation]<[Organization]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(DeleteOrganizationResponse)]
#[error(serror::Error)]
pub struct DeleteOrganization {
  pub name: String,
  #[serde(default)]
  pub etag: String,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type DeleteOrganizationResponse = Operation<Organization>;

//

/// Create a Project named `projects/{spec.project_id}` under an
/// Organization. Response: [Operation]<[Project]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(CreateProjectResponse)]
#[error(serror::Error)]
pub struct CreateProject {
  /// Owning organization name, eg. `organizations/acme`.
  pub parent: String,
  pub project: Project,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type CreateProjectResponse = Operation<Project>;

//

/// Update a Project. Response: [Operation]<[Project]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UpdateProjectResponse)]
#[error(serror::Error)]
pub struct UpdateProject {
  pub project: Project,
  #[serde(default)]
  pub update_mask: Vec<String>,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type UpdateProjectResponse = Operation<Project>;

//

/// Soft delete a Project. Response: [Operation]<[Project]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(DeleteProjectResponse)]
#[error(serror::Error)]
pub struct DeleteProject {
  pub name: String,
  #[serde(default)]
  pub etag: String,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type DeleteProjectResponse = Operation<Project>;
