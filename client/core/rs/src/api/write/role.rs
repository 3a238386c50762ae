use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{operation::Operation, role::Role};

use super::WardenWriteRequest;

/// Create a Role under a parent Service. The name is
/// `{parent}/roles/{spec.role_id}`. The role's permission closure is
/// projected before the call returns. Response: [Operation]<[Role]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(CreateRoleResponse)]
#[error(serror::Error)]
pub struct CreateRole {
  /// Parent resource name, eg. `services/library.example.com`.
  pub parent: String,
  /// The role to create. `spec.role_id` is required.
  pub role: Role,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type CreateRoleResponse = Operation<Role>;

//

/// Update a Role. Immutable fields (`spec.role_id`) are rejected when
/// changed under the mask. The role and every role inheriting from it
/// are reprojected. Response: [Operation]<[Role]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UpdateRoleResponse)]
#[error(serror::Error)]
pub struct UpdateRole {
  /// Replacement role. `name` selects the target.
  pub role: Role,
  /// Field paths to apply. Empty applies every mutable field.
  #[serde(default)]
  pub update_mask: Vec<String>,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type UpdateRoleResponse = Operation<Role>;

//

/// Soft delete a Role. Fails FAILED_PRECONDITION while any policy
/// binding references the role or another role inherits from it.
/// Response: [Operation]<[Role]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(DeleteRoleResponse)]
#[error(serror::Error)]
pub struct DeleteRole {
  /// The role name.
  pub name: String,
  /// If set, must match the stored etag.
  #[serde(default)]
  pub etag: String,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type DeleteRoleResponse = Operation<Role>;

//

/// Clear a Role's delete time and reproject its closure.
/// Response: [Operation]<[Role]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UndeleteRoleResponse)]
#[error(serror::Error)]
pub struct UndeleteRole {
  pub name: String,
}

#[typeshare]
pub type UndeleteRoleResponse = Operation<Role>;

//

/// Permanently remove a soft deleted Role. Response:
/// [Operation]<[Role]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(PurgeRoleResponse)]
#[error(serror::Error)]
pub struct PurgeRole {
  pub name: String,
}

#[typeshare]
pub type PurgeRoleResponse = Operation<Role>;
