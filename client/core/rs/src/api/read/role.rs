use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::role::Role;

use super::WardenReadRequest;

/// Get a Role by name, eg.
/// `services/library.example.com/roles/book-renter`.
/// Response: [Role].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(Role)]
#[error(serror::Error)]
pub struct GetRole {
  /// The role name.
  pub name: String,
}

//

/// List Roles under a parent. Response: [ListRolesResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(ListRolesResponse)]
#[error(serror::Error)]
pub struct ListRoles {
  /// Parent resource name, eg. `services/library.example.com`.
  /// Empty lists roles across parents.
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
pub struct ListRolesResponse {
  pub roles: Vec<Role>,
  #[serde(default)]
  pub next_page_token: String,
}
