use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use warden_client::entities::tuple::{ROLE_BINDING, Tuple};

use crate::relationship::TupleDelta;

pub mod model;
pub mod policy;
pub mod role;

/// Stable injective encoding of a permission string into a relation
/// id within the backend's allowed charset.
pub fn perm_hash(permission: &str) -> String {
  let digest = Sha256::digest(permission.as_bytes());
  format!("p{}", hex::encode(&digest[..16]))
}

/// Stable object id of the binding node attaching `role` to the
/// resource at `self_link`. The same pair always maps to the same
/// node, which keeps policy diffs tuple level idempotent.
pub fn binding_node(self_link: &str, role: &str) -> String {
  let digest =
    Sha256::digest(format!("{self_link}|{role}").as_bytes());
  format!("{ROLE_BINDING}:b{}", hex::encode(&digest[..16]))
}

/// The minimal write turning `existing` into `desired`.
pub fn tuple_delta(
  desired: &BTreeSet<Tuple>,
  existing: &BTreeSet<Tuple>,
) -> TupleDelta {
  TupleDelta {
    writes: desired.difference(existing).cloned().collect(),
    deletes: existing.difference(desired).cloned().collect(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn perm_hashes_are_stable_and_distinct() {
    let checkout = perm_hash("library.example.com/books.checkout");
    assert_eq!(
      checkout,
      perm_hash("library.example.com/books.checkout")
    );
    assert_ne!(
      checkout,
      perm_hash("library.example.com/books.return")
    );
    assert_eq!(checkout.len(), 33);
    assert!(
      checkout.chars().all(|c| c.is_ascii_alphanumeric())
    );
  }

  #[test]
  fn binding_nodes_key_on_resource_and_role() {
    let node = binding_node(
      "library.example.com/branches/central-park",
      "services/library.example.com/roles/library-admin",
    );
    assert_eq!(
      node,
      binding_node(
        "library.example.com/branches/central-park",
        "services/library.example.com/roles/library-admin",
      )
    );
    assert!(node.starts_with("RoleBinding:b"));
    assert_ne!(
      node,
      binding_node(
        "library.example.com/branches/central-park",
        "services/library.example.com/roles/book-renter",
      )
    );
  }

  #[test]
  fn tuple_delta_is_minimal() {
    let keep = Tuple::new("a", "r", "o");
    let add = Tuple::new("b", "r", "o");
    let drop = Tuple::new("c", "r", "o");
    let desired =
      BTreeSet::from([keep.clone(), add.clone()]);
    let existing =
      BTreeSet::from([keep.clone(), drop.clone()]);
    let delta = tuple_delta(&desired, &existing);
    assert_eq!(delta.writes, vec![add]);
    assert_eq!(delta.deletes, vec![drop]);
    assert!(tuple_delta(&desired, &desired).is_empty());
  }
}
