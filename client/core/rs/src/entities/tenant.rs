use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::resource::{Resource, ResourceSpec};

/// Top level tenancy container.
pub type Organization = Resource<OrganizationSpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct OrganizationSpec {
  /// DNS label identifying the organization. Immutable. The resource
  /// name is `organizations/{org_id}`.
  #[serde(default)]
  pub org_id: String,
}

impl ResourceSpec for OrganizationSpec {
  const TYPE: &'static str = "iam/Organization";
}

pub fn organization_name(org_id: &str) -> String {
  format!("organizations/{org_id}")
}

/// A Project groups resources under an Organization. The stored
/// `parent` field names the owning organization.
pub type Project = Resource<ProjectSpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ProjectSpec {
  /// DNS label identifying the project. Immutable. The resource name
  /// is `projects/{project_id}`.
  #[serde(default)]
  pub project_id: String,
}

impl ResourceSpec for ProjectSpec {
  const TYPE: &'static str = "iam/Project";
}

pub fn project_name(project_id: &str) -> String {
  format!("projects/{project_id}")
}
