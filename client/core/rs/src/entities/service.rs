use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::resource::{Resource, ResourceSpec};

/// A Service declares a namespace of resource types, the permissions
/// that exist on them, and their place in the resource hierarchy.
pub type Service = Resource<ServiceSpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ServiceSpec {
  /// DNS label identifying the service, eg. `library.example.com`.
  /// Immutable. The service resource name is `services/{service_id}`.
  #[serde(default)]
  pub service_id: String,

  /// The resource types declared by this service.
  #[serde(default)]
  pub resources: Vec<ResourceDef>,
}

impl ResourceSpec for ServiceSpec {
  const TYPE: &'static str = "iam/Service";
}

/// Declaration of one resource type inside a Service.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ResourceDef {
  /// Fully qualified type, eg. `library.example.com/Book`.
  /// Must begin with the owning service's id.
  #[serde(rename = "type")]
  pub resource_type: String,

  /// Singular form, eg. `book`.
  #[serde(default)]
  pub singular: String,

  /// Plural form, eg. `books`. Used in qualified permissions:
  /// `{service_id}/{plural}.{verb}`.
  #[serde(default)]
  pub plural: String,

  /// Bare permission verbs available on this type, eg. `checkout`.
  #[serde(default)]
  pub permissions: Vec<String>,

  /// Path patterns naming resources of this type, eg.
  /// `branches/{branch}/books/{book}`. `{param}` captures exactly one
  /// path segment.
  #[serde(default)]
  pub resource_name_patterns: Vec<String>,

  /// Declared parent types. Empty means root eligible. A `"*"` entry
  /// declares multi parent, which the parent walker rejects.
  #[serde(default)]
  pub parent_resources: Vec<String>,
}

impl ResourceDef {
  /// Qualified form of one of this type's verbs,
  /// eg. `library.example.com/books.checkout`.
  pub fn qualified_permission(
    &self,
    service_id: &str,
    verb: &str,
  ) -> String {
    format!("{service_id}/{}.{verb}", self.plural)
  }
}

impl ServiceSpec {
  pub fn resource_def(
    &self,
    resource_type: &str,
  ) -> Option<&ResourceDef> {
    self
      .resources
      .iter()
      .find(|def| def.resource_type == resource_type)
  }

  /// All qualified permissions declared by this service.
  pub fn qualified_permissions(&self) -> Vec<String> {
    self
      .resources
      .iter()
      .flat_map(|def| {
        def.permissions.iter().map(|verb| {
          def.qualified_permission(&self.service_id, verb)
        })
      })
      .collect()
  }
}

pub fn service_name(service_id: &str) -> String {
  format!("services/{service_id}")
}
