use anyhow::anyhow;
use warden_client::entities::{
  config::{RelationshipBackend, RelationshipStoreConfig},
  tuple::Tuple,
};

mod memory;
pub mod model;
mod openfga;

pub use memory::MemoryStore;
pub use openfga::OpenfgaStore;

use model::AuthorizationModel;

/// Tuples are read in pages of this size.
pub const READ_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct TupleFilter {
  pub object: Option<String>,
  pub relation: Option<String>,
  pub user: Option<String>,
}

impl TupleFilter {
  pub fn object(object: impl Into<String>) -> TupleFilter {
    TupleFilter {
      object: Some(object.into()),
      ..Default::default()
    }
  }

  pub fn object_relation(
    object: impl Into<String>,
    relation: impl Into<String>,
  ) -> TupleFilter {
    TupleFilter {
      object: Some(object.into()),
      relation: Some(relation.into()),
      ..Default::default()
    }
  }
}

/// An atomic batch of tuple writes and deletes.
#[derive(Debug, Clone, Default)]
pub struct TupleDelta {
  pub writes: Vec<Tuple>,
  pub deletes: Vec<Tuple>,
}

impl TupleDelta {
  pub fn is_empty(&self) -> bool {
    self.writes.is_empty() && self.deletes.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct CheckQuery {
  pub user: String,
  pub relation: String,
  pub object: String,
  /// Supplied for this check only, never persisted. The check engine
  /// passes parent relationships this way.
  pub contextual_tuples: Vec<Tuple>,
}

/// The relationship tuple backend. Either the in process evaluator
/// or an external OpenFGA compatible service; callers never reach
/// into the concrete implementation.
pub enum RelationshipStore {
  Memory(MemoryStore),
  Openfga(OpenfgaStore),
}

impl RelationshipStore {
  pub fn from_config(
    config: &RelationshipStoreConfig,
  ) -> anyhow::Result<RelationshipStore> {
    match config.backend {
      RelationshipBackend::Memory => {
        Ok(RelationshipStore::Memory(MemoryStore::default()))
      }
      RelationshipBackend::Openfga => {
        Ok(RelationshipStore::Openfga(OpenfgaStore::new(config)?))
      }
    }
  }

  /// Replace the projected type system.
  pub async fn write_model(
    &self,
    model: AuthorizationModel,
  ) -> serror::Result<()> {
    match self {
      RelationshipStore::Memory(store) => {
        store.write_model(model);
        Ok(())
      }
      RelationshipStore::Openfga(store) => {
        store.write_model(&model).await?;
        Ok(())
      }
    }
  }

  /// One page (up to [READ_PAGE_SIZE]) of tuples matching the
  /// filter, with a continuation token while more remain.
  pub async fn read(
    &self,
    filter: &TupleFilter,
    page_token: Option<String>,
  ) -> serror::Result<(Vec<Tuple>, Option<String>)> {
    let page = match self {
      RelationshipStore::Memory(store) => {
        store.read(filter, page_token)?
      }
      RelationshipStore::Openfga(store) => {
        store.read(filter, page_token).await?
      }
    };
    Ok(page)
  }

  /// Drain every page matching the filter.
  pub async fn read_all(
    &self,
    filter: &TupleFilter,
  ) -> serror::Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    let mut page_token = None;
    loop {
      let (page, next) = self.read(filter, page_token).await?;
      tuples.extend(page);
      match next {
        Some(next) => page_token = Some(next),
        None => return Ok(tuples),
      }
    }
  }

  /// All or nothing write of the delta. Empty deltas are skipped.
  pub async fn write(
    &self,
    delta: TupleDelta,
  ) -> serror::Result<()> {
    if delta.is_empty() {
      return Ok(());
    }
    match self {
      RelationshipStore::Memory(store) => {
        store.write(delta);
        Ok(())
      }
      RelationshipStore::Openfga(store) => {
        store.write(&delta).await?;
        Ok(())
      }
    }
  }

  pub async fn check(
    &self,
    query: CheckQuery,
  ) -> serror::Result<bool> {
    let allowed = match self {
      RelationshipStore::Memory(store) => store.check(&query)?,
      RelationshipStore::Openfga(store) => {
        store.check(&query).await?
      }
    };
    Ok(allowed)
  }
}

pub(crate) fn object_type_of(object: &str) -> anyhow::Result<&str> {
  object
    .split_once(':')
    .map(|(object_type, _)| object_type)
    .ok_or_else(|| {
      anyhow!("malformed tuple object '{object}': missing type")
    })
}
