use serde::{Deserialize, Serialize, de::DeserializeOwned};
use typeshare::typeshare;

use crate::entities::I64;

/// The common envelope shared by every Warden resource kind.
///
/// `uid`, `name`, `etag` and the timestamps are managed by the server;
/// callers only fill `display_name` / `description` / `spec` (and
/// `etag` when they want compare-and-swap update semantics).
#[typeshare]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<Spec: Default> {
  /// Server assigned unique id (UUID), immutable for the life of the
  /// resource.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub uid: String,

  /// The resource name, eg. `services/library.example.com` or
  /// `users/0d9257eb-...`. Immutable and unique among the same kind;
  /// reusable after purge.
  pub name: String,

  /// Human readable name. Maximum 150 characters.
  #[serde(default)]
  pub display_name: String,

  /// Free form description. Maximum 1000 characters.
  #[serde(default)]
  pub description: String,

  /// Opaque version token. An update passing a stale etag fails
  /// ABORTED.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub etag: String,

  /// Name of the parent resource, if the kind has one
  /// (eg. Projects name their Organization).
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub parent: String,

  /// Unix ms the resource was created. Server assigned.
  #[serde(default)]
  pub create_time: I64,

  /// Unix ms the resource was last written. Server assigned.
  #[serde(default)]
  pub update_time: I64,

  /// Unix ms the resource was soft deleted, or 0 while live.
  #[serde(default)]
  pub delete_time: I64,

  /// Kind specific configuration.
  #[serde(default)]
  pub spec: Spec,
}

impl<S: Default> Default for Resource<S> {
  fn default() -> Self {
    Self {
      uid: String::new(),
      name: String::new(),
      display_name: String::new(),
      description: String::new(),
      etag: String::new(),
      parent: String::new(),
      create_time: 0,
      update_time: 0,
      delete_time: 0,
      spec: S::default(),
    }
  }
}

impl<S: Default> Resource<S> {
  pub fn is_deleted(&self) -> bool {
    self.delete_time != 0
  }
}

/// Implemented by every concrete resource spec so generic code can
/// recover the fully qualified type of the message it carries.
pub trait ResourceSpec:
  Clone
  + Default
  + Send
  + Sync
  + Unpin
  + Serialize
  + DeserializeOwned
  + 'static
{
  /// Fully qualified resource type, eg. `iam/Service`.
  const TYPE: &'static str;
}
