use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::{operation::Operation, service::Service};

use super::WardenWriteRequest;

/// Declare a Service. The name is derived from `spec.service_id`
/// (`services/{service_id}`). The authorization model is reprojected
/// before the call returns. Response: [Operation]<[Service]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(CreateServiceResponse)]
#[error(serror::Error)]
pub struct CreateService {
  /// The service to create. `spec.service_id` is required.
  pub service: Service,
  /// Validate and return the would-be result without persisting.
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type CreateServiceResponse = Operation<Service>;

//

/// Update a Service. Only fields named in `update_mask` are applied;
/// immutable fields (`spec.service_id`) are rejected. If the passed
/// service carries an etag it must match the stored one.
/// Response: [Operation]<[Service]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UpdateServiceResponse)]
#[error(serror::Error)]
pub struct UpdateService {
  /// Replacement service. `name` selects the target.
  pub service: Service,
  /// Field paths to apply, eg. `["display_name", "spec.resources"]`.
  /// Empty applies every mutable field.
  #[serde(default)]
  pub update_mask: Vec<String>,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type UpdateServiceResponse = Operation<Service>;

//

/// Soft delete a Service. Response: [Operation]<[Service]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(DeleteServiceResponse)]
#[error(serror::Error)]
pub struct DeleteService {
  /// The service name.
  pub name: String,
  /// If set, must match the stored etag.
  #[serde(default)]
  pub etag: String,
  #[serde(default)]
  pub validate_only: bool,
}

#[typeshare]
pub type DeleteServiceResponse = Operation<Service>;

//

/// Clear a Service's delete time. Response: [Operation]<[Service]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(UndeleteServiceResponse)]
#[error(serror::Error)]
pub struct UndeleteService {
  pub name: String,
}

#[typeshare]
pub type UndeleteServiceResponse = Operation<Service>;

//

/// Permanently remove a soft deleted Service, freeing its name for
/// reuse. Response: [Operation]<[Service]>.
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenWriteRequest)]
#[response(PurgeServiceResponse)]
#[error(serror::Error)]
pub struct PurgeService {
  pub name: String,
}

#[typeshare]
pub type PurgeServiceResponse = Operation<Service>;
