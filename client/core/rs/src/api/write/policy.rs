use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{operation::Operation, policy::Policy};

use super::WardenWriteRequest;

/// Replace the IAM Policy on a resource URL. The binding set is
/// diffed against the projected tuples and the minimal delta is
/// written before the call returns; setting an identical policy twice
/// performs no tuple writes. Response: [Operation]<[Policy]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(SetIamPolicyResponse)]
#[error(serror::Error)]
pub struct SetIamPolicy {
  /// Resource URL the policy attaches to, eg.
  /// `library.example.com/branches/central-park-new-york`.
  pub resource: String,
  /// The full replacement policy.
  pub policy: Policy,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type SetIamPolicyResponse = Operation<Policy>;
