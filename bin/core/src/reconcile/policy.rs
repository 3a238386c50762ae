use std::collections::BTreeSet;

use warden_client::entities::{
  reference::ResourceReference,
  tuple::{
    INTERNAL_ROLE, INTERNAL_USER, ROLE_BINDING, Tuple,
    internal_role, internal_user, object_id,
  },
};

use crate::relationship::{RelationshipStore, TupleFilter};

use super::{binding_node, tuple_delta};

/// A policy binding with its members already canonicalized to
/// internal principal ids (`*` for `allAuthenticatedUsers`).
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
  pub role: String,
  pub principals: Vec<String>,
}

/// The tuple set materializing a policy: per binding, one attachment
/// to the target, one role edge, and one membership edge per member.
pub fn desired_policy_tuples(
  target: &ResourceReference,
  bindings: &[ResolvedBinding],
) -> BTreeSet<Tuple> {
  let object = object_id(target);
  let mut tuples = BTreeSet::new();
  for binding in bindings {
    let node = binding_node(&target.self_link, &binding.role);
    tuples.insert(Tuple::new(
      node.clone(),
      ROLE_BINDING,
      object.clone(),
    ));
    tuples.insert(Tuple::new(
      internal_role(&binding.role),
      INTERNAL_ROLE,
      node.clone(),
    ));
    for principal in &binding.principals {
      tuples.insert(Tuple::new(
        internal_user(principal),
        INTERNAL_USER,
        node.clone(),
      ));
    }
  }
  tuples
}

/// Replace the projected binding set for `target` with `bindings`.
///
/// Existing state is read binding node by binding node (the
/// attachment tuples on the target, then each node's own tuples,
/// including nodes the desired set reuses), diffed against the
/// desired set, and written as one atomic delta. Identical
/// projections produce an empty delta and skip the write entirely.
pub async fn project_policy(
  store: &RelationshipStore,
  target: &ResourceReference,
  bindings: &[ResolvedBinding],
) -> serror::Result<()> {
  let desired = desired_policy_tuples(target, bindings);

  let object = object_id(target);
  let attachments = store
    .read_all(&TupleFilter::object_relation(
      object.clone(),
      ROLE_BINDING,
    ))
    .await?;

  let mut existing =
    attachments.iter().cloned().collect::<BTreeSet<_>>();
  let mut nodes = attachments
    .into_iter()
    .map(|tuple| tuple.user)
    .collect::<BTreeSet<_>>();
  // Nodes the desired set targets may hold stale tuples even when
  // their attachment is gone.
  nodes.extend(
    bindings
      .iter()
      .map(|b| binding_node(&target.self_link, &b.role)),
  );
  for node in nodes {
    existing.extend(
      store.read_all(&TupleFilter::object(node)).await?,
    );
  }

  store.write(tuple_delta(&desired, &existing)).await
}

#[cfg(test)]
mod tests {
  use warden_client::entities::reference::ResourceReference;

  use crate::relationship::MemoryStore;

  use super::*;

  fn target() -> ResourceReference {
    ResourceReference::new(
      "library.example.com/Branch",
      "branches/central-park-new-york",
    )
  }

  fn admin_binding() -> ResolvedBinding {
    ResolvedBinding {
      role: String::from(
        "services/library.example.com/roles/library-admin",
      ),
      principals: vec![String::from("users/1111")],
    }
  }

  async fn all_tuples(store: &RelationshipStore) -> BTreeSet<Tuple> {
    store
      .read_all(&TupleFilter::default())
      .await
      .unwrap()
      .into_iter()
      .collect()
  }

  #[tokio::test]
  async fn materializes_three_tuple_shapes() {
    let tuples =
      desired_policy_tuples(&target(), &[admin_binding()]);
    assert_eq!(tuples.len(), 3);
    let node = binding_node(
      "library.example.com/branches/central-park-new-york",
      "services/library.example.com/roles/library-admin",
    );
    assert!(tuples.contains(&Tuple::new(
      node.clone(),
      ROLE_BINDING,
      "library.example.com/Branch:branches/central-park-new-york",
    )));
    assert!(tuples.contains(&Tuple::new(
      "InternalRole:services/library.example.com/roles/library-admin",
      INTERNAL_ROLE,
      node.clone(),
    )));
    assert!(tuples.contains(&Tuple::new(
      "InternalUser:users/1111",
      INTERNAL_USER,
      node,
    )));
  }

  #[tokio::test]
  async fn reprojection_is_idempotent_and_replacement_is_minimal() {
    let store = RelationshipStore::Memory(MemoryStore::default());
    let target = target();

    project_policy(&store, &target, &[admin_binding()])
      .await
      .unwrap();
    let first = all_tuples(&store).await;
    assert_eq!(
      first,
      desired_policy_tuples(&target, &[admin_binding()])
    );

    // Second identical set: nothing changes.
    project_policy(&store, &target, &[admin_binding()])
      .await
      .unwrap();
    assert_eq!(all_tuples(&store).await, first);

    // Member swap on the same binding keeps the node, replaces the
    // membership edge.
    let mut swapped = admin_binding();
    swapped.principals = vec![String::from("users/2222")];
    project_policy(&store, &target, &[swapped.clone()])
      .await
      .unwrap();
    let after = all_tuples(&store).await;
    assert_eq!(
      after,
      desired_policy_tuples(&target, &[swapped])
    );

    // Empty policy clears every projected tuple.
    project_policy(&store, &target, &[]).await.unwrap();
    assert!(all_tuples(&store).await.is_empty());
  }
}
