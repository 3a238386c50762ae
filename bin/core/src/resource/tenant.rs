use database::Stored;
use mungos::mongodb::Collection;
use warden_client::entities::tenant::{
  Organization, OrganizationSpec, Project, ProjectSpec,
};

use crate::state::db_client;

use super::WardenResource;

impl WardenResource for Organization {
  type Spec = OrganizationSpec;

  fn kind() -> &'static str {
    "Organization"
  }

  fn coll() -> &'static Collection<Stored<Organization>> {
    &db_client().organizations
  }

  const IMMUTABLE_FIELDS: &'static [&'static str] = &["spec.org_id"];
}

impl WardenResource for Project {
  type Spec = ProjectSpec;

  fn kind() -> &'static str {
    "Project"
  }

  fn coll() -> &'static Collection<Stored<Project>> {
    &db_client().projects
  }

  const IMMUTABLE_FIELDS: &'static [&'static str] =
    &["spec.project_id"];

  const PARENT_TYPE: Option<&'static str> = Some("iam/Organization");
}
