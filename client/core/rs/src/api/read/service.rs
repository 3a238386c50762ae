use derive_empty_traits::EmptyTraits;
use resolver_api::Resolve;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::service::Service;

use super::WardenReadRequest;

/// Get a Service by name, eg. `services/library.example.com`.
/// Response: [Service].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(Service)]
#[error(serror::Error)]
pub struct GetService {
  /// The service name.
  pub name: String,
}

//

/// List declared Services. Response: [ListServicesResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(ListServicesResponse)]
#[error(serror::Error)]
pub struct ListServices {
  /// Items per page. 0 uses the default (50). Maximum 500.
  #[serde(default)]
  pub page_size: i64,
  /// Cursor from a previous page.
  #[serde(default)]
  pub page_token: String,
  /// Single `field=value` clause over name / parent / display_name.
  #[serde(default)]
  pub filter: String,
  /// Include soft deleted services.
  #[serde(default)]
  pub show_deleted: bool,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListServicesResponse {
  pub services: Vec<Service>,
  /// Set iff another page may exist.
  #[serde(default)]
  pub next_page_token: String,
}

//

/// Get the Warden Core version. Response: [GetVersionResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Default, Resolve, EmptyTraits,
)]
#[empty_traits(WardenReadRequest)]
#[response(GetVersionResponse)]
#[error(serror::Error)]
pub struct GetVersion {}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetVersionResponse {
  /// The version of the running core server.
  pub version: String,
}
