use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::resource::{Resource, ResourceSpec};

/// A Role is a reusable bundle of permissions, optionally composed
/// from other roles by inheritance.
pub type Role = Resource<RoleSpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct RoleSpec {
  /// DNS label identifying the role under its parent, eg.
  /// `library-admin`. Immutable. The role resource name is
  /// `{parent}/roles/{role_id}`.
  #[serde(default)]
  pub role_id: String,

  /// Qualified permissions granted directly by this role,
  /// eg. `library.example.com/books.checkout`.
  #[serde(default)]
  pub included_permissions: Vec<String>,

  /// Names of roles whose permission closures this role also grants.
  /// Forms a DAG; cycles are tolerated and broken at expansion.
  #[serde(default)]
  pub inherited_roles: Vec<String>,
}

impl ResourceSpec for RoleSpec {
  const TYPE: &'static str = "iam/Role";
}

pub fn role_name(parent: &str, role_id: &str) -> String {
  format!("{parent}/roles/{role_id}")
}
