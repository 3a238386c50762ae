use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, anyhow};
use reqwest::StatusCode;
use serror::AddStatusCodeError;
use warden_client::entities::{
  role::Role,
  subject::WILDCARD_PRINCIPAL,
  tuple::{Tuple, internal_role, internal_user},
};

use crate::{
  relationship::{RelationshipStore, TupleFilter},
  resource,
};

use super::{perm_hash, tuple_delta};

/// Hard cap on roles touched while walking the inheritance graph in
/// either direction.
pub const MAX_ROLE_VISITS: usize = 9999;

/// Where role expansion reads roles from. Mongo backed in
/// production, map backed in tests.
pub trait RoleSource: Send + Sync {
  /// Fetch a live role by name. None when missing or soft deleted.
  fn fetch_role(
    &self,
    name: &str,
  ) -> impl Future<Output = anyhow::Result<Option<Role>>> + Send;

  /// Live roles directly inheriting from `name`.
  fn roles_inheriting(
    &self,
    name: &str,
  ) -> impl Future<Output = anyhow::Result<Vec<Role>>> + Send;
}

pub struct DbRoleSource;

impl RoleSource for DbRoleSource {
  async fn fetch_role(
    &self,
    name: &str,
  ) -> anyhow::Result<Option<Role>> {
    let role = resource::get_optional::<Role>(name)
      .await
      .map_err(|e| e.error)?;
    Ok(role.filter(|role| !role.is_deleted()))
  }

  async fn roles_inheriting(
    &self,
    name: &str,
  ) -> anyhow::Result<Vec<Role>> {
    resource::roles_inheriting(name)
      .await
      .map_err(|e| e.error)
  }
}

/// The transitive closure of permissions granted by `role`:
/// its own included permissions plus the closures of every inherited
/// role. Iterative DFS; the visited set makes cyclic inheritance
/// yield a finite closure.
pub async fn expand_role<S: RoleSource>(
  source: &S,
  role: &Role,
) -> serror::Result<BTreeSet<String>> {
  let mut permissions = BTreeSet::new();
  let mut visited = HashSet::from([role.name.clone()]);
  let mut stack = role.spec.inherited_roles.clone();
  let mut visits = 0;

  permissions
    .extend(role.spec.included_permissions.iter().cloned());

  while let Some(name) = stack.pop() {
    if !visited.insert(name.clone()) {
      continue;
    }
    visits += 1;
    if visits > MAX_ROLE_VISITS {
      return Err(
        anyhow!(
          "role expansion of '{}' aborted after {MAX_ROLE_VISITS} visits",
          role.name
        )
        .status_code(StatusCode::INTERNAL_SERVER_ERROR),
      );
    }
    let Some(inherited) = source
      .fetch_role(&name)
      .await
      .context("failed to load inherited role")?
    else {
      warn!(
        "role '{}' inherits missing role '{name}', skipping",
        role.name
      );
      continue;
    };
    permissions
      .extend(inherited.spec.included_permissions.iter().cloned());
    stack.extend(inherited.spec.inherited_roles.iter().cloned());
  }

  Ok(permissions)
}

/// Project `role`'s closure as
/// `(InternalUser:*, permHash(p), InternalRole:{name})` tuples,
/// writing only the delta against what the store holds. Soft deleted
/// roles project an empty closure, clearing their tuples.
pub async fn project_role<S: RoleSource>(
  source: &S,
  store: &RelationshipStore,
  role: &Role,
) -> serror::Result<()> {
  let closure = if role.is_deleted() {
    BTreeSet::new()
  } else {
    expand_role(source, role).await?
  };

  let object = internal_role(&role.name);
  let desired = closure
    .iter()
    .map(|permission| {
      Tuple::new(
        internal_user(WILDCARD_PRINCIPAL),
        perm_hash(permission),
        object.clone(),
      )
    })
    .collect::<BTreeSet<_>>();

  let existing = store
    .read_all(&TupleFilter::object(object))
    .await?
    .into_iter()
    .collect::<BTreeSet<_>>();

  store.write(tuple_delta(&desired, &existing)).await
}

/// Reproject `role` and, through the reverse inheritance relation,
/// every role whose closure it feeds. Bounded DFS; exceeding
/// [MAX_ROLE_VISITS] aborts INTERNAL rather than looping on an
/// unexpected graph.
pub async fn cascade_role<S: RoleSource>(
  source: &S,
  store: &RelationshipStore,
  role: &Role,
) -> serror::Result<()> {
  let mut visited = HashSet::new();
  let mut stack = vec![role.clone()];
  let mut visits = 0;

  while let Some(role) = stack.pop() {
    if !visited.insert(role.name.clone()) {
      continue;
    }
    visits += 1;
    if visits > MAX_ROLE_VISITS {
      return Err(
        anyhow!(
          "role reprojection aborted: inheritance graph exceeded {MAX_ROLE_VISITS} visits"
        )
        .status_code(StatusCode::INTERNAL_SERVER_ERROR),
      );
    }
    project_role(source, store, &role).await?;
    stack.extend(
      source
        .roles_inheriting(&role.name)
        .await
        .context("failed to load inheriting roles for cascade")?,
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use crate::fixtures::{MapRoleSource, role};

  use super::*;

  #[tokio::test]
  async fn closure_is_the_union_over_inheritance() {
    let renter = role(
      "services/library.example.com/roles/book-renter",
      &[
        "library.example.com/books.checkout",
        "library.example.com/books.return",
      ],
      &[],
    );
    let super_renter = role(
      "services/library.example.com/roles/super-renter",
      &[],
      &["services/library.example.com/roles/book-renter"],
    );
    let source =
      MapRoleSource::new(vec![renter.clone(), super_renter.clone()]);

    let closure = expand_role(&source, &super_renter).await.unwrap();
    assert_eq!(
      closure,
      renter
        .spec
        .included_permissions
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
    );
  }

  #[tokio::test]
  async fn cyclic_inheritance_yields_finite_closure() {
    let a = role(
      "services/library.example.com/roles/a",
      &["library.example.com/books.checkout"],
      &["services/library.example.com/roles/b"],
    );
    let b = role(
      "services/library.example.com/roles/b",
      &["library.example.com/books.return"],
      &["services/library.example.com/roles/a"],
    );
    let source = MapRoleSource::new(vec![a.clone(), b]);

    let closure = expand_role(&source, &a).await.unwrap();
    assert_eq!(closure.len(), 2);
  }

  #[tokio::test]
  async fn projection_is_a_minimal_delta() {
    use crate::relationship::{MemoryStore, RelationshipStore};

    let renter = role(
      "services/library.example.com/roles/book-renter",
      &[
        "library.example.com/books.checkout",
        "library.example.com/books.return",
      ],
      &[],
    );
    let source = MapRoleSource::new(vec![renter.clone()]);
    let store = RelationshipStore::Memory(MemoryStore::default());

    project_role(&source, &store, &renter).await.unwrap();
    let object = internal_role(&renter.name);
    let first = store
      .read_all(&TupleFilter::object(object.clone()))
      .await
      .unwrap();
    assert_eq!(first.len(), 2);

    // Identical reprojection changes nothing.
    project_role(&source, &store, &renter).await.unwrap();
    let second = store
      .read_all(&TupleFilter::object(object.clone()))
      .await
      .unwrap();
    assert_eq!(first, second);

    // Dropping a permission deletes exactly its tuple.
    let mut narrowed = renter.clone();
    narrowed.spec.included_permissions =
      vec![String::from("library.example.com/books.checkout")];
    let source = MapRoleSource::new(vec![narrowed.clone()]);
    project_role(&source, &store, &narrowed).await.unwrap();
    let third = store
      .read_all(&TupleFilter::object(object))
      .await
      .unwrap();
    assert_eq!(third.len(), 1);
  }
}
