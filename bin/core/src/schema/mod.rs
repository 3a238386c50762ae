use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, anyhow};
use arc_swap::ArcSwap;
use regex::Regex;
use reqwest::StatusCode;
use serror::AddStatusCodeError;
use warden_client::entities::{
  reference::{ROOT_URL_PREFIX, ResourceReference},
  service::{Service, service_name},
};

use crate::resource;

pub mod parent;
pub mod subject;

/// Where the schema registry reads Service declarations from.
/// Mongo backed in production, map backed in tests.
pub trait ServiceSource: Send + Sync {
  /// Fetch a live service by id. None when missing or soft deleted.
  fn fetch_service(
    &self,
    service_id: &str,
  ) -> impl Future<Output = anyhow::Result<Option<Service>>> + Send;
}

pub struct DbServiceSource;

impl ServiceSource for DbServiceSource {
  async fn fetch_service(
    &self,
    service_id: &str,
  ) -> anyhow::Result<Option<Service>> {
    let service = resource::get_optional::<Service>(&service_name(
      service_id,
    ))
    .await
    .map_err(|e| e.error)?;
    Ok(service.filter(|service| !service.is_deleted()))
  }
}

struct CompiledPattern {
  regex: Regex,
  resource_type: String,
}

/// Resolves free form resource URLs (`{service_id}/{path}`) into
/// typed references using the name patterns Services declare.
///
/// Compiled patterns are cached per service. Readers take a snapshot
/// of the cache; rebuilds swap a new map in whole, so a reader racing
/// a rebuild sees either version (both compute the same entries).
/// Invalidation happens synchronously on Service writes, before the
/// write returns.
pub struct SchemaRegistry<S> {
  source: S,
  cache: ArcSwap<HashMap<String, Arc<Vec<CompiledPattern>>>>,
}

impl<S: ServiceSource> SchemaRegistry<S> {
  pub fn new(source: S) -> SchemaRegistry<S> {
    SchemaRegistry {
      source,
      cache: ArcSwap::from_pointee(HashMap::new()),
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Resolve `{service_id}/{path}` against the declared patterns.
  pub async fn resolve(
    &self,
    resource_url: &str,
  ) -> serror::Result<ResourceReference> {
    if resource_url == ROOT_URL_PREFIX {
      return Ok(ResourceReference::root(None));
    }
    if let Some(type_suffix) =
      resource_url.strip_prefix("iam/root/")
    {
      return Ok(ResourceReference::root(Some(type_suffix)));
    }

    let Some((service_id, path)) = resource_url.split_once('/')
    else {
      return Err(
        anyhow!(
          "invalid resource url '{resource_url}': expected {{service}}/{{path}}"
        )
        .status_code(StatusCode::BAD_REQUEST),
      );
    };
    if path.is_empty() {
      return Err(
        anyhow!("invalid resource url '{resource_url}': empty path")
          .status_code(StatusCode::BAD_REQUEST),
      );
    }

    let entries = self.entries(service_id).await?;
    for entry in entries.iter() {
      if entry.regex.is_match(path) {
        return Ok(ResourceReference::new(
          entry.resource_type.clone(),
          path,
        ));
      }
    }
    Err(
      anyhow!(
        "no resource name pattern on service '{service_id}' matches '{path}'"
      )
      .status_code(StatusCode::BAD_REQUEST),
    )
  }

  async fn entries(
    &self,
    service_id: &str,
  ) -> serror::Result<Arc<Vec<CompiledPattern>>> {
    if let Some(entries) = self.cache.load().get(service_id) {
      return Ok(entries.clone());
    }
    let service = self
      .source
      .fetch_service(service_id)
      .await
      .context("failed to fetch service for schema resolution")?
      .ok_or_else(|| {
        anyhow!("unknown service '{service_id}'")
          .status_code(StatusCode::BAD_REQUEST)
      })?;
    let entries = Arc::new(compile_service(&service)?);
    // Concurrent first use: both rebuilds compute the same entries,
    // the last insert wins.
    self.cache.rcu(|cache| {
      let mut cache = HashMap::clone(cache);
      cache.insert(String::from(service_id), entries.clone());
      cache
    });
    Ok(entries)
  }

  /// Drop every compiled entry. Service writes trigger this through
  /// the model reconciler before they return, so later resolutions
  /// never see patterns from a replaced declaration.
  pub fn invalidate_all(&self) {
    self.cache.store(Arc::new(HashMap::new()));
  }
}

fn compile_service(
  service: &Service,
) -> serror::Result<Vec<CompiledPattern>> {
  let mut entries = Vec::new();
  for def in &service.spec.resources {
    for pattern in &def.resource_name_patterns {
      entries.push(CompiledPattern {
        regex: compile_pattern(pattern).with_context(|| {
          format!(
            "failed to compile pattern '{pattern}' on type '{}'",
            def.resource_type
          )
        })?,
        resource_type: def.resource_type.clone(),
      });
    }
  }
  Ok(entries)
}

/// `branches/{branch}/books/{book}` compiles to
/// `^branches/[^/]+/books/[^/]+$`.
fn compile_pattern(pattern: &str) -> anyhow::Result<Regex> {
  let mut regex = String::from("^");
  for (i, segment) in pattern.split('/').enumerate() {
    if i > 0 {
      regex.push('/');
    }
    if segment.starts_with('{')
      && segment.ends_with('}')
      && segment.len() > 2
    {
      regex.push_str("[^/]+");
    } else {
      regex.push_str(&regex::escape(segment));
    }
  }
  regex.push('$');
  Regex::new(&regex).context("invalid resource name pattern")
}

#[cfg(test)]
mod tests {
  use crate::fixtures::{MapServiceSource, library_service};

  use super::*;

  fn registry() -> SchemaRegistry<MapServiceSource> {
    SchemaRegistry::new(MapServiceSource::new(vec![
      library_service(),
    ]))
  }

  #[tokio::test]
  async fn resolves_declared_patterns() {
    let registry = registry();
    let branch = registry
      .resolve("library.example.com/branches/central-park-new-york")
      .await
      .unwrap();
    assert_eq!(branch.resource_type, "library.example.com/Branch");
    assert_eq!(branch.name, "branches/central-park-new-york");
    assert_eq!(
      branch.self_link,
      "library.example.com/branches/central-park-new-york"
    );

    let book = registry
      .resolve(
        "library.example.com/branches/central-park/books/alice-in-wonderland",
      )
      .await
      .unwrap();
    assert_eq!(book.resource_type, "library.example.com/Book");
  }

  #[tokio::test]
  async fn resolves_the_synthetic_root() {
    let registry = registry();
    let root = registry.resolve("iam/root").await.unwrap();
    assert!(root.is_root());
    assert_eq!(root.name, "root");

    let typed = registry
      .resolve("iam/root/library.example.com/Branch")
      .await
      .unwrap();
    assert!(typed.is_root());
    assert_eq!(typed.name, "root/library.example.com/Branch");
  }

  #[tokio::test]
  async fn rejects_unresolvable_urls() {
    let registry = registry();
    // unknown service
    assert!(registry.resolve("printing/presses/gutenberg").await.is_err());
    // no pattern match
    assert!(
      registry
        .resolve("library.example.com/librarians/marian")
        .await
        .is_err()
    );
    // missing path
    assert!(registry.resolve("library.example.com").await.is_err());
    // param must capture exactly one segment
    assert!(
      registry
        .resolve("library.example.com/branches/a/b")
        .await
        .is_err()
    );
  }

  #[tokio::test]
  async fn invalidation_drops_cached_patterns() {
    let registry = registry();
    registry
      .resolve("library.example.com/branches/central-park")
      .await
      .unwrap();
    assert!(
      registry.cache.load().contains_key("library.example.com")
    );
    registry.invalidate_all();
    assert!(
      !registry.cache.load().contains_key("library.example.com")
    );
  }
}
