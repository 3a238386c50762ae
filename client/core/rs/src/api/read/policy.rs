use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::policy::Policy;

use super::WardenReadRequest;

/// Get the IAM Policy attached to a resource URL. Returns an empty
/// policy if none has been set. Response: [Policy].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(Policy)]
#[error(serror::Error)]
pub struct GetIamPolicy {
  /// Resource URL, eg.
  /// `library.example.com/branches/central-park-new-york`.
  pub resource: String,
}
