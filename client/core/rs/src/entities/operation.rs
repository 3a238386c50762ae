use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

use crate::entities::JsonValue;

/// Envelope returned by every mutating operation. Warden reconciles
/// synchronously on the write path, so `done` is always true and
/// `response` carries the result; the envelope exists so the surface
/// can move to deferred reconciliation without changing shape.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct Operation<T> {
  /// `operations/{uuid}`
  pub name: String,

  #[serde(default)]
  pub done: bool,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata: Option<JsonValue>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response: Option<T>,
}

impl<T> Operation<T> {
  /// A synchronously completed operation carrying its result.
  pub fn completed(response: T) -> Operation<T> {
    Operation {
      name: format!("operations/{}", Uuid::new_v4()),
      done: true,
      metadata: None,
      response: Some(response),
    }
  }
}
