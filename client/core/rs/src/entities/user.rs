use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::resource::{Resource, ResourceSpec};

/// A User is a subject known to Warden by external identifier
/// (email). The stored resource name (`users/{user_id}`) is the
/// internal principal id written into relationship tuples.
pub type User = Resource<UserSpec>;

#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct UserSpec {
  /// External identifier the subject authenticates as. Immutable.
  #[serde(default)]
  pub email: String,

  /// Identity provider assigned id, set via `SetUserProviderId`.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub provider_id: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub given_name: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub family_name: String,
}

impl ResourceSpec for UserSpec {
  const TYPE: &'static str = "iam/User";
}

pub fn user_name(user_id: &str) -> String {
  format!("users/{user_id}")
}
