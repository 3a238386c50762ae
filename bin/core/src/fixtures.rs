//! Map backed implementations of the store seams, doubling as the
//! library integration fixture used across test modules.

use std::collections::HashMap;

use warden_client::entities::{
  role::{Role, RoleSpec},
  service::{Service, ServiceSpec, ResourceDef},
};

use crate::{reconcile::role::RoleSource, schema::ServiceSource};

/// The library service: branches, with books beneath them.
pub fn library_service() -> Service {
  Service {
    name: String::from("services/library.example.com"),
    spec: ServiceSpec {
      service_id: String::from("library.example.com"),
      resources: vec![
        ResourceDef {
          resource_type: String::from("library.example.com/Branch"),
          singular: String::from("branch"),
          plural: String::from("branches"),
          permissions: ["create", "get", "list", "update", "delete"]
            .map(String::from)
            .into(),
          resource_name_patterns: vec![String::from(
            "branches/{branch}",
          )],
          parent_resources: vec![],
        },
        ResourceDef {
          resource_type: String::from("library.example.com/Book"),
          singular: String::from("book"),
          plural: String::from("books"),
          permissions: [
            "create", "get", "checkout", "return", "delete",
          ]
          .map(String::from)
          .into(),
          resource_name_patterns: vec![String::from(
            "branches/{branch}/books/{book}",
          )],
          parent_resources: vec![String::from(
            "library.example.com/Branch",
          )],
        },
      ],
    },
    ..Default::default()
  }
}

pub fn role(
  name: &str,
  included: &[&str],
  inherited: &[&str],
) -> Role {
  let role_id = name.rsplit('/').next().unwrap_or(name);
  Role {
    name: String::from(name),
    spec: RoleSpec {
      role_id: String::from(role_id),
      included_permissions:
        included.iter().map(|p| String::from(*p)).collect(),
      inherited_roles:
        inherited.iter().map(|r| String::from(*r)).collect(),
    },
    ..Default::default()
  }
}

pub struct MapServiceSource(HashMap<String, Service>);

impl MapServiceSource {
  pub fn new(services: Vec<Service>) -> MapServiceSource {
    MapServiceSource(
      services
        .into_iter()
        .map(|service| {
          (service.spec.service_id.clone(), service)
        })
        .collect(),
    )
  }
}

impl ServiceSource for MapServiceSource {
  async fn fetch_service(
    &self,
    service_id: &str,
  ) -> anyhow::Result<Option<Service>> {
    Ok(self.0.get(service_id).cloned())
  }
}

pub struct MapRoleSource(HashMap<String, Role>);

impl MapRoleSource {
  pub fn new(roles: Vec<Role>) -> MapRoleSource {
    MapRoleSource(
      roles
        .into_iter()
        .map(|role| (role.name.clone(), role))
        .collect(),
    )
  }
}

impl RoleSource for MapRoleSource {
  async fn fetch_role(
    &self,
    name: &str,
  ) -> anyhow::Result<Option<Role>> {
    Ok(self.0.get(name).cloned())
  }

  async fn roles_inheriting(
    &self,
    name: &str,
  ) -> anyhow::Result<Vec<Role>> {
    Ok(
      self
        .0
        .values()
        .filter(|role| {
          role.spec.inherited_roles.iter().any(|r| r == name)
        })
        .cloned()
        .collect(),
    )
  }
}
