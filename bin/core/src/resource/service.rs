use database::Stored;
use mungos::mongodb::Collection;
use warden_client::entities::service::{Service, ServiceSpec};

use crate::state::db_client;

use super::WardenResource;

impl WardenResource for Service {
  type Spec = ServiceSpec;

  fn kind() -> &'static str {
    "Service"
  }

  fn coll() -> &'static Collection<Stored<Service>> {
    &db_client().services
  }

  const IMMUTABLE_FIELDS: &'static [&'static str] =
    &["spec.service_id"];
}
