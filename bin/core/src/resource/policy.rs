use database::Stored;
use mungos::mongodb::Collection;
use warden_client::entities::policy::{Policy, PolicySpec};

use crate::state::db_client;

use super::WardenResource;

impl WardenResource for Policy {
  type Spec = PolicySpec;

  fn kind() -> &'static str {
    "Policy"
  }

  fn coll() -> &'static Collection<Stored<Policy>> {
    &db_client().policies
  }
}

/// The stored policy for a resource URL, if one has been set. Policy
/// names are the self link of their target.
pub async fn policy_for(
  self_link: &str,
) -> serror::Result<Option<Policy>> {
  super::get_optional::<Policy>(self_link).await
}
