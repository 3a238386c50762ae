use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::tenant::{Organization, Project};

use super::WardenReadRequest;

/// Get an Organization by name, eg. `organizations/{org_id}`.
/// Response: [Organization].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(Organization)]
#[error(serror::Error)]
pub struct GetOrganization {
  pub name: String,
}

//

/// List Organizations. Response: [ListOrganizationsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(ListOrganizationsResponse)]
#[error(serror::Error)]
pub struct ListOrganizations {
  #[serde(default)]
  pub page_size: i64,
  #[serde(default)]
  pub page_token: String,
  #[serde(default)]
  pub filter: String,
  #[serde(default)]
  pub show_deleted: bool,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListOrganizationsResponse {
  pub organizations: Vec<Organization>,
  #[serde(default)]
  pub next_page_token: String,
}

//

/// Get a Project by name, eg. `projects/{project_id}`.
/// Response: [Project].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(Project)]
#[error(serror::Error)]
pub struct GetProject {
  pub name: String,
}

//

/// List Projects, optionally under one Organization.
/// Response: [ListProjectsResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(ListProjectsResponse)]
#[error(serror::Error)]
pub struct ListProjects {
  /// Organization name to scope by, or empty for all.
  #[serde(default)]
  pub parent: String,
  #[serde(default)]
  pub page_size: i64,
  #[serde(default)]
  pub page_token: String,
  #[serde(default)]
  pub filter: String,
  #[serde(default)]
  pub show_deleted: bool,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListProjectsResponse {
  pub projects: Vec<Project>,
  #[serde(default)]
  pub next_page_token: String,
}
