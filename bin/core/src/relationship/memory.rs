use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{Context, anyhow};
use warden_client::entities::tuple::Tuple;

use super::{
  CheckQuery, READ_PAGE_SIZE, TupleDelta, TupleFilter,
  model::{AuthorizationModel, Userset},
  object_type_of,
};

/// In process relationship store: an indexed tuple set plus a
/// recursive userset evaluator over the projected model.
///
/// Writes take the single write lock, so a delta applies all or
/// nothing. Checks evaluate against a read locked snapshot merged
/// with the query's contextual tuples.
#[derive(Default)]
pub struct MemoryStore {
  state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
  model: AuthorizationModel,
  /// object -> relation -> users
  index: HashMap<String, HashMap<String, BTreeSet<String>>>,
}

impl MemoryState {
  fn insert(&mut self, tuple: Tuple) {
    self
      .index
      .entry(tuple.object)
      .or_default()
      .entry(tuple.relation)
      .or_default()
      .insert(tuple.user);
  }

  fn remove(&mut self, tuple: &Tuple) {
    let Some(relations) = self.index.get_mut(&tuple.object) else {
      return;
    };
    if let Some(users) = relations.get_mut(&tuple.relation) {
      users.remove(&tuple.user);
      if users.is_empty() {
        relations.remove(&tuple.relation);
      }
    }
    if relations.is_empty() {
      self.index.remove(&tuple.object);
    }
  }
}

impl MemoryStore {
  pub fn write_model(&self, model: AuthorizationModel) {
    self.state.write().unwrap().model = model;
  }

  pub fn write(&self, delta: TupleDelta) {
    let mut state = self.state.write().unwrap();
    for tuple in &delta.deletes {
      state.remove(tuple);
    }
    for tuple in delta.writes {
      state.insert(tuple);
    }
  }

  pub fn read(
    &self,
    filter: &TupleFilter,
    page_token: Option<String>,
  ) -> anyhow::Result<(Vec<Tuple>, Option<String>)> {
    let offset = match page_token {
      Some(token) => token
        .parse::<usize>()
        .context("invalid tuple continuation token")?,
      None => 0,
    };
    let state = self.state.read().unwrap();
    let mut matching = Vec::new();
    for (object, relations) in &state.index {
      if let Some(want) = &filter.object
        && want != object
      {
        continue;
      }
      for (relation, users) in relations {
        if let Some(want) = &filter.relation
          && want != relation
        {
          continue;
        }
        for user in users {
          if let Some(want) = &filter.user
            && want != user
          {
            continue;
          }
          matching.push(Tuple::new(
            user.clone(),
            relation.clone(),
            object.clone(),
          ));
        }
      }
    }
    matching.sort();
    let end = matching.len().min(offset + READ_PAGE_SIZE);
    let page = matching
      .get(offset..end)
      .map(<[Tuple]>::to_vec)
      .unwrap_or_default();
    let next_token = if end < matching.len() {
      Some(end.to_string())
    } else {
      None
    };
    Ok((page, next_token))
  }

  pub fn check(&self, query: &CheckQuery) -> anyhow::Result<bool> {
    let state = self.state.read().unwrap();
    let mut contextual: HashMap<
      (String, String),
      BTreeSet<String>,
    > = HashMap::new();
    for tuple in &query.contextual_tuples {
      contextual
        .entry((tuple.object.clone(), tuple.relation.clone()))
        .or_default()
        .insert(tuple.user.clone());
    }
    let evaluator = Evaluator {
      state: &state,
      contextual,
    };
    let mut visited = HashSet::new();
    evaluator.check(
      &query.user,
      &query.relation,
      &query.object,
      &mut visited,
    )
  }
}

struct Evaluator<'a> {
  state: &'a MemoryState,
  contextual: HashMap<(String, String), BTreeSet<String>>,
}

type Visited = HashSet<(String, String, String)>;

impl Evaluator<'_> {
  /// The direct users of `relation` on `object`, stored and
  /// contextual.
  fn users(&self, object: &str, relation: &str) -> Vec<&str> {
    let mut users = Vec::new();
    if let Some(stored) = self
      .state
      .index
      .get(object)
      .and_then(|relations| relations.get(relation))
    {
      users.extend(stored.iter().map(String::as_str));
    }
    if let Some(ctx) = self
      .contextual
      .get(&(String::from(object), String::from(relation)))
    {
      users.extend(ctx.iter().map(String::as_str));
    }
    users
  }

  fn check(
    &self,
    user: &str,
    relation: &str,
    object: &str,
    visited: &mut Visited,
  ) -> anyhow::Result<bool> {
    // Break evaluation cycles (eg. accidental parent loops). The
    // logic is negation free, so a blocked revisit cannot flip an
    // outcome.
    if !visited.insert((
      String::from(user),
      String::from(relation),
      String::from(object),
    )) {
      return Ok(false);
    }
    let object_type = object_type_of(object)?;
    let Some(type_def) = self.state.model.type_def(object_type)
    else {
      return Ok(false);
    };
    let Some(userset) = type_def.relations.get(relation) else {
      return Ok(false);
    };
    self.eval(userset, user, relation, object, visited)
  }

  fn eval(
    &self,
    userset: &Userset,
    user: &str,
    relation: &str,
    object: &str,
    visited: &mut Visited,
  ) -> anyhow::Result<bool> {
    match userset {
      Userset::This => Ok(self.direct(user, relation, object)),
      Userset::Computed(computed) => {
        self.check(user, computed, object, visited)
      }
      Userset::TupleTo { tupleset, computed } => {
        for subject in self.users(object, tupleset) {
          // subject is itself an object id, eg a binding node or a
          // parent resource.
          if self.check(user, computed, subject, visited)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
      Userset::Union(children) => {
        for child in children {
          if self.eval(child, user, relation, object, visited)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
      Userset::Intersection(children) => {
        if children.is_empty() {
          return Err(anyhow!(
            "invalid model: empty intersection on relation '{relation}'"
          ));
        }
        for child in children {
          if !self.eval(child, user, relation, object, visited)? {
            return Ok(false);
          }
        }
        Ok(true)
      }
    }
  }

  fn direct(&self, user: &str, relation: &str, object: &str) -> bool {
    let users = self.users(object, relation);
    if users.iter().any(|u| *u == user) {
      return true;
    }
    // A `{type}:*` tuple matches every user of that type.
    match user.split_once(':') {
      Some((user_type, _)) => {
        let wildcard = format!("{user_type}:*");
        users.iter().any(|u| *u == wildcard)
      }
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use warden_client::entities::tuple::Tuple;

  use crate::relationship::model::TypeDefinition;

  use super::*;

  fn model() -> AuthorizationModel {
    // Minimal two level hierarchy: folder <- doc, with `view`
    // granted directly or inherited from the parent folder.
    let mut types = HashMap::new();
    types.insert(
      String::from("folder"),
      TypeDefinition {
        relations: HashMap::from([
          (String::from("parent"), Userset::This),
          (String::from("view"), Userset::This),
        ]),
      },
    );
    types.insert(
      String::from("doc"),
      TypeDefinition {
        relations: HashMap::from([
          (String::from("parent"), Userset::This),
          (
            String::from("view"),
            Userset::Union(vec![
              Userset::This,
              Userset::TupleTo {
                tupleset: String::from("parent"),
                computed: String::from("view"),
              },
            ]),
          ),
        ]),
      },
    );
    AuthorizationModel { types }
  }

  fn check(
    store: &MemoryStore,
    user: &str,
    relation: &str,
    object: &str,
    contextual: Vec<Tuple>,
  ) -> bool {
    store
      .check(&CheckQuery {
        user: String::from(user),
        relation: String::from(relation),
        object: String::from(object),
        contextual_tuples: contextual,
      })
      .unwrap()
  }

  #[test]
  fn direct_and_inherited_grants() {
    let store = MemoryStore::default();
    store.write_model(model());
    store.write(TupleDelta {
      writes: vec![
        Tuple::new("user:amy", "view", "folder:a"),
        Tuple::new("folder:a", "parent", "doc:readme"),
      ],
      deletes: vec![],
    });

    assert!(check(&store, "user:amy", "view", "doc:readme", vec![]));
    assert!(check(&store, "user:amy", "view", "folder:a", vec![]));
    assert!(!check(&store, "user:bob", "view", "doc:readme", vec![]));
    // unknown relation / type evaluate to false, not error
    assert!(!check(&store, "user:amy", "edit", "doc:readme", vec![]));
    assert!(!check(&store, "user:amy", "view", "nope:1", vec![]));
  }

  #[test]
  fn contextual_tuples_are_not_persisted() {
    let store = MemoryStore::default();
    store.write_model(model());
    store.write(TupleDelta {
      writes: vec![Tuple::new("user:amy", "view", "folder:a")],
      deletes: vec![],
    });

    let ctx = vec![Tuple::new("folder:a", "parent", "doc:readme")];
    assert!(check(&store, "user:amy", "view", "doc:readme", ctx));
    // without the contextual parent edge the grant is gone
    assert!(!check(&store, "user:amy", "view", "doc:readme", vec![]));
  }

  #[test]
  fn wildcard_users_match_type() {
    let store = MemoryStore::default();
    store.write_model(model());
    store.write(TupleDelta {
      writes: vec![Tuple::new("user:*", "view", "folder:a")],
      deletes: vec![],
    });
    assert!(check(&store, "user:amy", "view", "folder:a", vec![]));
    assert!(!check(&store, "robot:r2", "view", "folder:a", vec![]));
  }

  #[test]
  fn parent_cycles_terminate() {
    let store = MemoryStore::default();
    store.write_model(model());
    store.write(TupleDelta {
      writes: vec![
        Tuple::new("doc:b", "parent", "doc:a"),
        Tuple::new("doc:a", "parent", "doc:b"),
      ],
      deletes: vec![],
    });
    assert!(!check(&store, "user:amy", "view", "doc:a", vec![]));
  }

  #[test]
  fn writes_are_deltas_and_deletes_apply() {
    let store = MemoryStore::default();
    store.write_model(model());
    store.write(TupleDelta {
      writes: vec![Tuple::new("user:amy", "view", "folder:a")],
      deletes: vec![],
    });
    assert!(check(&store, "user:amy", "view", "folder:a", vec![]));
    store.write(TupleDelta {
      writes: vec![],
      deletes: vec![Tuple::new("user:amy", "view", "folder:a")],
    });
    assert!(!check(&store, "user:amy", "view", "folder:a", vec![]));
  }

  #[test]
  fn reads_page_with_continuation_tokens() {
    let store = MemoryStore::default();
    store.write_model(model());
    let writes = (0..250)
      .map(|i| {
        Tuple::new(format!("user:u{i:03}"), "view", "folder:a")
      })
      .collect();
    store.write(TupleDelta {
      writes,
      deletes: vec![],
    });

    let filter = TupleFilter::object_relation("folder:a", "view");
    let (first, token) = store.read(&filter, None).unwrap();
    assert_eq!(first.len(), READ_PAGE_SIZE);
    let (second, token) =
      store.read(&filter, token).unwrap();
    assert_eq!(second.len(), READ_PAGE_SIZE);
    let (third, token) = store.read(&filter, token).unwrap();
    assert_eq!(third.len(), 50);
    assert!(token.is_none());
  }
}
