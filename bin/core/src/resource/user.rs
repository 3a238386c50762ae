use anyhow::Context;
use database::Stored;
use mungos::mongodb::{Collection, bson::doc};
use warden_client::entities::user::{User, UserSpec};

use crate::state::db_client;

use super::WardenResource;

impl WardenResource for User {
  type Spec = UserSpec;

  fn kind() -> &'static str {
    "User"
  }

  fn coll() -> &'static Collection<Stored<User>> {
    &db_client().users
  }

  // User listings back account pickers, which page deeper than the
  // standard cap.
  const MAX_PAGE_SIZE: i64 = 1000;

  const IMMUTABLE_FIELDS: &'static [&'static str] = &["spec.email"];
}

/// Look up a live user by external identifier.
pub async fn user_by_email(
  email: &str,
) -> serror::Result<Option<User>> {
  let user = User::coll()
    .find_one(doc! {
      "data.value.spec.email": email,
      "data.value.delete_time": 0_i64,
    })
    .await
    .context("failed to query db for user by email")?;
  Ok(user.map(Stored::into_inner))
}
