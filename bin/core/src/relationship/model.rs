use std::collections::HashMap;

/// The type system the authorization model reconciler projects into
/// the relationship store. Each object type declares its relations
/// and how each relation is satisfied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationModel {
  pub types: HashMap<String, TypeDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefinition {
  pub relations: HashMap<String, Userset>,
}

/// How a relation resolves to a set of users.
#[derive(Debug, Clone, PartialEq)]
pub enum Userset {
  /// The users written directly into tuples on this relation.
  This,
  /// The users holding another relation on the same object.
  Computed(String),
  /// For each user U of `tupleset` on this object (U is itself an
  /// object id), the users holding `computed` on U.
  TupleTo { tupleset: String, computed: String },
  Union(Vec<Userset>),
  Intersection(Vec<Userset>),
}

impl AuthorizationModel {
  pub fn type_def(
    &self,
    object_type: &str,
  ) -> Option<&TypeDefinition> {
    self.types.get(object_type)
  }
}
