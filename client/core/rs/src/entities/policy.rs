use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::resource::{Resource, ResourceSpec};

/// The Policy for a resource is the authoritative set of role
/// bindings on it. `SetIamPolicy` is a full replacement.
pub type Policy = Resource<PolicySpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct PolicySpec {
  /// The bindings attached to the target resource.
  #[serde(default)]
  pub bindings: Vec<Binding>,
}

impl ResourceSpec for PolicySpec {
  const TYPE: &'static str = "iam/Policy";
}

/// Grants one role to a set of members.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct Binding {
  /// Full role name, eg.
  /// `services/library.example.com/roles/book-renter`.
  pub role: String,

  /// `allAuthenticatedUsers`, `user:{id}` or `serviceAccount:{id}`.
  #[serde(default)]
  pub members: Vec<String>,
}

/// An empty policy for a resource which has none set.
pub fn empty_policy(resource: impl Into<String>) -> Policy {
  Policy {
    name: resource.into(),
    ..Default::default()
  }
}
