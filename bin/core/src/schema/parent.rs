use std::collections::{HashMap, HashSet};

use anyhow::{Context, anyhow};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serror::AddStatusCodeError;
use warden_client::entities::{
  reference::{ParentRelationship, ResourceName, ResourceReference},
  role::Role,
  tenant::Project,
};

use crate::resource::{self, WardenResource};

use super::{SchemaRegistry, ServiceSource};

pub type ParentResolver = fn(
  ResourceReference,
) -> BoxFuture<
  'static,
  serror::Result<Option<ResourceReference>>,
>;

/// Maps resource type to the function producing its parent
/// reference. Populated once at startup and immutable afterwards.
#[derive(Default)]
pub struct ParentResolverRegistry {
  resolvers: HashMap<String, ParentResolver>,
}

impl ParentResolverRegistry {
  pub fn new() -> ParentResolverRegistry {
    Default::default()
  }

  pub fn register(
    &mut self,
    resource_type: &str,
    resolver: ParentResolver,
  ) {
    self
      .resolvers
      .insert(String::from(resource_type), resolver);
  }

  /// One hop up the hierarchy.
  ///
  /// Types without a registered resolver fall back to their
  /// declaration: a `*` parent is unsupported and errors, anything
  /// else has no walkable parent (the caller context supplies the
  /// hierarchy for such types).
  pub async fn resolve_parent<S: ServiceSource>(
    &self,
    schema: &SchemaRegistry<S>,
    reference: &ResourceReference,
  ) -> serror::Result<Option<ResourceReference>> {
    if reference.is_root() {
      return Ok(None);
    }
    if let Some(resolver) =
      self.resolvers.get(&reference.resource_type)
    {
      return resolver(reference.clone()).await;
    }
    let Some((service_id, _)) =
      reference.resource_type.split_once('/')
    else {
      return Ok(None);
    };
    let Some(service) = schema
      .source()
      .fetch_service(service_id)
      .await
      .context("failed to fetch service during parent walk")?
    else {
      return Ok(None);
    };
    let Some(def) =
      service.spec.resource_def(&reference.resource_type)
    else {
      return Ok(None);
    };
    if def.parent_resources.iter().any(|parent| parent == "*") {
      return Err(
        anyhow!(
          "cannot resolve parent of '{}': multi-parent ('*') resource types are unsupported",
          reference.self_link
        )
        .status_code(StatusCode::BAD_REQUEST),
      );
    }
    Ok(None)
  }

  /// The full ancestor chain of `reference`, nearest parent first.
  /// A visited set terminates accidental cycles.
  pub async fn chain<S: ServiceSource>(
    &self,
    schema: &SchemaRegistry<S>,
    reference: &ResourceReference,
  ) -> serror::Result<Vec<ParentRelationship>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = reference.clone();
    while let Some(parent) =
      self.resolve_parent(schema, &current).await?
    {
      if !visited.insert(parent.self_link.clone()) {
        break;
      }
      chain.push(ParentRelationship {
        parent: ResourceName {
          resource_type: parent.resource_type.clone(),
          name: parent.name.clone(),
        },
        child: ResourceName {
          resource_type: current.resource_type.clone(),
          name: current.name.clone(),
        },
      });
      current = parent;
    }
    Ok(chain)
  }
}

/// Default resolver for stored kinds: read the resource, return its
/// `parent` field typed by the kind's declared parent type.
/// NOT_FOUND along the way normalizes to no parent, so checks against
/// just deleted resources still evaluate remaining ancestors.
fn stored_parent<T: WardenResource>(
  reference: ResourceReference,
) -> BoxFuture<'static, serror::Result<Option<ResourceReference>>> {
  Box::pin(async move {
    let Some(parent_type) = T::PARENT_TYPE else {
      return Ok(None);
    };
    let Some(stored) =
      resource::get_optional::<T>(&reference.name).await?
    else {
      return Ok(None);
    };
    if stored.parent.is_empty() {
      return Ok(None);
    }
    Ok(Some(ResourceReference::new(parent_type, stored.parent)))
  })
}

/// The resolvers for Warden's own stored kinds.
pub fn default_registry() -> ParentResolverRegistry {
  let mut registry = ParentResolverRegistry::new();
  registry.register("iam/Project", stored_parent::<Project>);
  registry.register("iam/Role", stored_parent::<Role>);
  registry
}

#[cfg(test)]
mod tests {
  use crate::fixtures::{MapServiceSource, library_service};

  use super::*;

  #[tokio::test]
  async fn multi_parent_types_error() {
    let mut service = library_service();
    service.spec.resources[1]
      .parent_resources
      .push(String::from("*"));
    let schema =
      SchemaRegistry::new(MapServiceSource::new(vec![service]));
    let registry = ParentResolverRegistry::new();
    let book = ResourceReference::new(
      "library.example.com/Book",
      "branches/central-park/books/alice",
    );
    assert!(
      registry.resolve_parent(&schema, &book).await.is_err()
    );
  }

  #[tokio::test]
  async fn declared_types_have_no_walkable_parent() {
    let schema = SchemaRegistry::new(MapServiceSource::new(vec![
      library_service(),
    ]));
    let registry = ParentResolverRegistry::new();
    let book = ResourceReference::new(
      "library.example.com/Book",
      "branches/central-park/books/alice",
    );
    let chain = registry.chain(&schema, &book).await.unwrap();
    assert!(chain.is_empty());
  }

  fn book_parent(
    reference: ResourceReference,
  ) -> BoxFuture<'static, serror::Result<Option<ResourceReference>>>
  {
    Box::pin(async move {
      Ok(reference.name.split_once("/books/").map(
        |(branch, _)| {
          ResourceReference::new(
            "library.example.com/Branch",
            branch,
          )
        },
      ))
    })
  }

  #[tokio::test]
  async fn registered_resolvers_drive_the_chain() {
    let schema = SchemaRegistry::new(MapServiceSource::new(vec![
      library_service(),
    ]));
    let mut registry = ParentResolverRegistry::new();
    registry.register("library.example.com/Book", book_parent);

    let book = ResourceReference::new(
      "library.example.com/Book",
      "branches/central-park/books/alice",
    );
    let chain = registry.chain(&schema, &book).await.unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(
      chain[0].parent.resource_type,
      "library.example.com/Branch"
    );
    assert_eq!(chain[0].parent.name, "branches/central-park");
    assert_eq!(chain[0].child.name, book.name);
  }

  fn self_parent(
    reference: ResourceReference,
  ) -> BoxFuture<'static, serror::Result<Option<ResourceReference>>>
  {
    Box::pin(async move {
      Ok(Some(ResourceReference::new(
        reference.resource_type,
        reference.name,
      )))
    })
  }

  #[tokio::test]
  async fn cyclic_chains_terminate() {
    let schema = SchemaRegistry::new(MapServiceSource::new(vec![
      library_service(),
    ]));
    let mut registry = ParentResolverRegistry::new();
    registry.register("library.example.com/Branch", self_parent);

    let branch = ResourceReference::new(
      "library.example.com/Branch",
      "branches/central-park",
    );
    let chain = registry.chain(&schema, &branch).await.unwrap();
    assert_eq!(chain.len(), 1);
  }
}
