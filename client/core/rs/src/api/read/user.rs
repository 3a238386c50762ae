use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::user::User;

use super::WardenReadRequest;

/// Get a User by name, eg. `users/{user_id}`. Response: [User].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(User)]
#[error(serror::Error)]
pub struct GetUser {
  /// The user name.
  pub name: String,
}

//

/// List Users. Response: [ListUsersResponse].
///
/// The page size cap for users is 1000 rather than the standard 500.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(ListUsersResponse)]
#[error(serror::Error)]
pub struct ListUsers {
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
pub struct ListUsersResponse {
  pub users: Vec<User>,
  #[serde(default)]
  pub next_page_token: String,
}
