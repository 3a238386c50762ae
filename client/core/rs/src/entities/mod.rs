use serde::{Deserialize, Serialize};
use serror::Serror;
use typeshare::typeshare;

/// [CoreConfig][config::CoreConfig] and its environment overrides.
pub mod config;
/// Subtypes of [LogConfig][logger::LogConfig].
pub mod logger;
/// The [Operation][operation::Operation] envelope returned by mutating calls.
pub mod operation;
/// Qualified [Permission][permission::Permission] handling.
pub mod permission;
/// Subtypes of [Policy][policy::Policy].
pub mod policy;
/// [ResourceReference][reference::ResourceReference] and parent relationships.
pub mod reference;
/// The generic [Resource][resource::Resource] envelope shared by all kinds.
pub mod resource;
/// Subtypes of [Role][role::Role].
pub mod role;
/// Subtypes of [Service][service::Service].
pub mod service;
/// [Subject][subject::Subject] parsing.
pub mod subject;
/// Organizations and Projects.
pub mod tenant;
/// Relationship [Tuple][tuple::Tuple]s and the reserved object types.
pub mod tuple;
/// Subtypes of [User][user::User].
pub mod user;

#[typeshare(serialized_as = "number")]
pub type I64 = i64;
#[typeshare(serialized_as = "number")]
pub type U64 = u64;
#[typeshare(serialized_as = "any")]
pub type JsonValue = serde_json::Value;
#[typeshare(serialized_as = "__Serror")]
pub type _Serror = Serror;

/// Unix timestamp in milliseconds, the time representation used across
/// all Warden entities (`create_time` / `update_time` / `delete_time`).
pub fn warden_timestamp() -> I64 {
  async_timing_util::unix_timestamp_ms() as I64
}

/// Represents an empty json object: `{}`
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct NoData {}

pub fn optional_string(string: impl Into<String>) -> Option<String> {
  let string = string.into();
  if string.is_empty() { None } else { Some(string) }
}
