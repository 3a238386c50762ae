use derive_empty_traits::EmptyTraits;
use resolver_api::{HasResponse, Resolve};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::entities::reference::ParentRelationship;

pub trait WardenCheckRequest: HasResponse {}

/// Ask whether `subject` may exercise `permission` on `resource`.
///
/// When `context` is empty the server walks the registered parent
/// resolvers to assemble the resource's ancestor chain; callers
/// holding the hierarchy (eg. the owning service) supply it
/// explicitly instead. Response: [CheckAccessResponse].
#[typeshare]
#[derive(
  Serialize, Deserialize, Debug, Clone, Resolve, EmptyTraits,
)]
#[empty_traits(WardenCheckRequest)]
#[response(CheckAccessResponse)]
#[error(serror::Error)]
pub struct CheckAccess {
  /// `allAuthenticatedUsers`, `user:{id}` or `serviceAccount:{id}`.
  pub subject: String,
  /// Qualified permission, eg. `library.example.com/books.checkout`.
  pub permission: String,
  /// Resource URL, eg.
  /// `library.example.com/branches/central-park/books/alice`.
  pub resource: String,
  /// Parent relationships contextualizing `resource`.
  #[serde(default)]
  pub context: Vec<ParentRelationship>,
}

#[typeshare]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CheckAccessResponse {
  pub allowed: bool,
}
