use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::reference::{ROOT_TYPE, ResourceReference};

/// Reserved tuple object type for the synthetic root.
pub const ROOT_OBJECT_TYPE: &str = "Root";
/// Reserved tuple object type for roles.
pub const INTERNAL_ROLE: &str = "InternalRole";
/// Reserved tuple object type for principals.
pub const INTERNAL_USER: &str = "InternalUser";
/// Reserved tuple object type for role binding nodes.
pub const ROLE_BINDING: &str = "RoleBinding";
/// Reserved relation linking a child object to its parent.
pub const RELATION_PARENT: &str = "parent";

/// A `(user, relation, object)` triple in the relationship store.
/// User and object are `{type}:{name}` strings.
#[typeshare]
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub struct Tuple {
  pub user: String,
  pub relation: String,
  pub object: String,
}

impl Tuple {
  pub fn new(
    user: impl Into<String>,
    relation: impl Into<String>,
    object: impl Into<String>,
  ) -> Tuple {
    Tuple {
      user: user.into(),
      relation: relation.into(),
      object: object.into(),
    }
  }
}

/// Tuple object type for a resource type: the reserved `Root` for the
/// synthetic ancestor, the declared type FQN otherwise.
pub fn tuple_type(resource_type: &str) -> &str {
  if resource_type == ROOT_TYPE {
    ROOT_OBJECT_TYPE
  } else {
    resource_type
  }
}

/// `{type}:{name}` object id for a resolved reference.
pub fn object_id(reference: &ResourceReference) -> String {
  format!(
    "{}:{}",
    tuple_type(&reference.resource_type),
    reference.name
  )
}

pub fn internal_user(principal: &str) -> String {
  format!("{INTERNAL_USER}:{principal}")
}

pub fn internal_role(role_name: &str) -> String {
  format!("{INTERNAL_ROLE}:{role_name}")
}

/// The per type root object global bindings attach to,
/// eg. `Root:root/library.example.com/Branch`.
pub fn root_object(resource_type: &str) -> String {
  format!("{ROOT_OBJECT_TYPE}:root/{resource_type}")
}
