use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use database::Stored;
use mungos::{find::find_collect, mongodb::bson::doc};
use warden_client::entities::{
  service::Service,
  tuple::{
    INTERNAL_ROLE, INTERNAL_USER, RELATION_PARENT,
    ROLE_BINDING, ROOT_OBJECT_TYPE,
  },
};

use crate::{
  relationship::model::{
    AuthorizationModel, TypeDefinition, Userset,
  },
  resource::WardenResource,
  state,
};

use super::perm_hash;

/// Project the full Service table into the relationship store's type
/// system. Idempotent; converges in a single pass. Runs on the write
/// path of every Service mutation (and once at startup), so the next
/// check reads its own writes.
pub async fn reconcile_model() -> serror::Result<()> {
  let services = find_collect(
    Service::coll(),
    doc! { "data.value.delete_time": 0_i64 },
    None,
  )
  .await
  .context("failed to pull services for model projection")?
  .into_iter()
  .map(Stored::into_inner)
  .collect::<Vec<_>>();

  let model = build_model(&services);
  state::relationship_store().write_model(model).await?;
  // Compiled url patterns may reference stale declarations now.
  // Clearing before returning keeps resolution read-your-writes.
  state::schema_registry().invalidate_all();

  info!("reprojected authorization model");
  Ok(())
}

/// The type system for a set of Services.
///
/// Every declared type carries `parent` and `RoleBinding` relations
/// plus one relation per known permission, satisfied through a role
/// binding on the object itself or through the parent chain. Every
/// permission relation is declared on every type (and on `Root`), so
/// grants bound anywhere on an ancestor path evaluate on descendants
/// of any type.
pub fn build_model(services: &[Service]) -> AuthorizationModel {
  let mut permissions = BTreeSet::new();
  let mut resource_types = Vec::new();
  for service in services {
    resource_types.extend(
      service
        .spec
        .resources
        .iter()
        .map(|def| def.resource_type.clone()),
    );
    permissions.extend(
      service
        .spec
        .qualified_permissions()
        .iter()
        .map(|permission| perm_hash(permission)),
    );
  }

  let mut types = HashMap::new();

  for resource_type in resource_types {
    let mut relations = HashMap::from([
      (String::from(RELATION_PARENT), Userset::This),
      (String::from(ROLE_BINDING), Userset::This),
    ]);
    for ph in &permissions {
      relations.insert(
        ph.clone(),
        Userset::Union(vec![
          Userset::TupleTo {
            tupleset: String::from(ROLE_BINDING),
            computed: ph.clone(),
          },
          Userset::TupleTo {
            tupleset: String::from(RELATION_PARENT),
            computed: ph.clone(),
          },
        ]),
      );
    }
    types.insert(resource_type, TypeDefinition { relations });
  }

  // The synthetic root: the universal ancestor, itself a binding
  // target (global per type grants) but parent of nothing above it.
  let mut root_relations =
    HashMap::from([(String::from(ROLE_BINDING), Userset::This)]);
  for ph in &permissions {
    root_relations.insert(
      ph.clone(),
      Userset::TupleTo {
        tupleset: String::from(ROLE_BINDING),
        computed: ph.clone(),
      },
    );
  }
  types.insert(
    String::from(ROOT_OBJECT_TYPE),
    TypeDefinition {
      relations: root_relations,
    },
  );

  // Binding nodes: a subject holds a permission through a binding
  // when the bound role contains it AND the subject is a member.
  let mut binding_relations = HashMap::from([
    (String::from(INTERNAL_ROLE), Userset::This),
    (String::from(INTERNAL_USER), Userset::This),
  ]);
  for ph in &permissions {
    binding_relations.insert(
      ph.clone(),
      Userset::Intersection(vec![
        Userset::TupleTo {
          tupleset: String::from(INTERNAL_ROLE),
          computed: ph.clone(),
        },
        Userset::Computed(String::from(INTERNAL_USER)),
      ]),
    );
  }
  types.insert(
    String::from(ROLE_BINDING),
    TypeDefinition {
      relations: binding_relations,
    },
  );

  // Roles hold their expanded permission set as direct tuples.
  let mut role_relations = HashMap::new();
  for ph in &permissions {
    role_relations.insert(ph.clone(), Userset::This);
  }
  types.insert(
    String::from(INTERNAL_ROLE),
    TypeDefinition {
      relations: role_relations,
    },
  );

  types
    .insert(String::from(INTERNAL_USER), TypeDefinition::default());

  AuthorizationModel { types }
}

#[cfg(test)]
mod tests {
  use crate::fixtures::library_service;

  use super::*;

  #[test]
  fn model_covers_declared_types_and_framework_types() {
    let model = build_model(&[library_service()]);
    for object_type in [
      "library.example.com/Branch",
      "library.example.com/Book",
      ROOT_OBJECT_TYPE,
      ROLE_BINDING,
      INTERNAL_ROLE,
      INTERNAL_USER,
    ] {
      assert!(
        model.type_def(object_type).is_some(),
        "missing type {object_type}"
      );
    }

    let branch =
      model.type_def("library.example.com/Branch").unwrap();
    assert_eq!(
      branch.relations.get(RELATION_PARENT),
      Some(&Userset::This)
    );
    // Book permissions evaluate on Branch objects, so grants on a
    // branch cover the books beneath it.
    let checkout = perm_hash("library.example.com/books.checkout");
    assert!(branch.relations.contains_key(&checkout));
    assert!(
      model
        .type_def(ROOT_OBJECT_TYPE)
        .unwrap()
        .relations
        .contains_key(&checkout)
    );
  }
}
