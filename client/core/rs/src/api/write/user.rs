use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{operation::Operation, user::User};

use super::WardenWriteRequest;

/// Create a User. The name is server assigned (`users/{uuid}`).
/// `spec.email` is required and unique among live users.
/// Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(CreateUserResponse)]
#[error(serror::Error)]
pub struct CreateUser {
  pub user: User,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type CreateUserResponse = Operation<User>;

//

/// Update a User. `spec.email` is immutable; `spec.provider_id` is
/// only written through [SetUserProviderId].
/// Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UpdateUserResponse)]
#[error(serror::Error)]
pub struct UpdateUser {
  /// Replacement user. `name` selects the target.
  pub user: User,
  /// Field paths to apply. Empty applies every mutable field.
  #[serde(default)]
  pub update_mask: Vec<String>,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type UpdateUserResponse = Operation<User>;

//

/// Soft delete a User. Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(DeleteUserResponse)]
#[error(serror::Error)]
pub struct DeleteUser {
  /// The user name.
  pub name: String,
  /// If set, must match the stored etag.
  #[serde(default)]
  pub etag: String,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type DeleteUserResponse = Operation<User>;

//

/// Clear a User's delete time. Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UndeleteUserResponse)]
#[error(serror::Error)]
pub struct UndeleteUser {
  pub name: String,
}

#[typeshare]
pub type UndeleteUserResponse = Operation<User>;

//

/// Permanently remove a soft deleted User.
/// Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(PurgeUserResponse)]
#[error(serror::Error)]
pub struct PurgeUser {
  pub name: String,
}

#[typeshare]
pub type PurgeUserResponse = Operation<User>;

//

/// Record the identity provider's id for a User.
/// Response: [Operation]<[User]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(SetUserProviderIdResponse)]
#[error(serror::Error)]
pub struct SetUserProviderId {
  /// The user name.
  pub name: String,
  /// The provider assigned id.
  pub provider_id: String,
}

#[typeshare]
pub type SetUserProviderIdResponse = Operation<User>;
