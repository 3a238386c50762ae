use anyhow::{Context, anyhow};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use warden_client::entities::{
  config::RelationshipStoreConfig,
  tuple::{INTERNAL_ROLE, INTERNAL_USER, ROLE_BINDING, Tuple},
};

use super::{
  CheckQuery, READ_PAGE_SIZE, TupleDelta, TupleFilter,
  model::{AuthorizationModel, Userset},
};

/// Client for an external OpenFGA compatible tuple service.
pub struct OpenfgaStore {
  http: reqwest::Client,
  url: String,
  store: String,
  token: String,
}

#[derive(Serialize)]
struct TupleKey<'a> {
  user: &'a str,
  relation: &'a str,
  object: &'a str,
}

impl<'a> From<&'a Tuple> for TupleKey<'a> {
  fn from(tuple: &'a Tuple) -> TupleKey<'a> {
    TupleKey {
      user: &tuple.user,
      relation: &tuple.relation,
      object: &tuple.object,
    }
  }
}

#[derive(serde::Deserialize)]
struct CheckResponse {
  #[serde(default)]
  allowed: bool,
}

#[derive(serde::Deserialize)]
struct ReadResponse {
  #[serde(default)]
  tuples: Vec<ReadTuple>,
  #[serde(default)]
  continuation_token: String,
}

#[derive(serde::Deserialize)]
struct ReadTuple {
  key: ReadTupleKey,
}

#[derive(serde::Deserialize)]
struct ReadTupleKey {
  user: String,
  relation: String,
  object: String,
}

impl OpenfgaStore {
  pub fn new(
    config: &RelationshipStoreConfig,
  ) -> anyhow::Result<OpenfgaStore> {
    if config.openfga_url.is_empty()
      || config.openfga_store.is_empty()
    {
      return Err(anyhow!(
        "'config.relationship' not configured correctly. the openfga backend requires 'config.relationship.openfga_url' and 'config.relationship.openfga_store'"
      ));
    }
    Ok(OpenfgaStore {
      http: Default::default(),
      url: config
        .openfga_url
        .trim_end_matches('/')
        .to_string(),
      store: config.openfga_store.clone(),
      token: config.openfga_token.clone(),
    })
  }

  pub async fn check(
    &self,
    query: &CheckQuery,
  ) -> anyhow::Result<bool> {
    let mut body = json!({
      "tuple_key": {
        "user": query.user,
        "relation": query.relation,
        "object": query.object,
      },
    });
    if !query.contextual_tuples.is_empty() {
      let keys = query
        .contextual_tuples
        .iter()
        .map(TupleKey::from)
        .collect::<Vec<_>>();
      body["contextual_tuples"] = json!({ "tuple_keys": keys });
    }
    let res: CheckResponse = self.post("check", &body).await?;
    Ok(res.allowed)
  }

  pub async fn read(
    &self,
    filter: &TupleFilter,
    page_token: Option<String>,
  ) -> anyhow::Result<(Vec<Tuple>, Option<String>)> {
    let mut tuple_key = serde_json::Map::new();
    if let Some(object) = &filter.object {
      tuple_key.insert(String::from("object"), json!(object));
    }
    if let Some(relation) = &filter.relation {
      tuple_key.insert(String::from("relation"), json!(relation));
    }
    if let Some(user) = &filter.user {
      tuple_key.insert(String::from("user"), json!(user));
    }
    let mut body = json!({
      "tuple_key": tuple_key,
      "page_size": READ_PAGE_SIZE,
    });
    if let Some(token) = page_token {
      body["continuation_token"] = json!(token);
    }
    let res: ReadResponse = self.post("read", &body).await?;
    let tuples = res
      .tuples
      .into_iter()
      .map(|t| Tuple::new(t.key.user, t.key.relation, t.key.object))
      .collect();
    let next = if res.continuation_token.is_empty() {
      None
    } else {
      Some(res.continuation_token)
    };
    Ok((tuples, next))
  }

  pub async fn write(
    &self,
    delta: &TupleDelta,
  ) -> anyhow::Result<()> {
    let mut body = serde_json::Map::new();
    if !delta.writes.is_empty() {
      let keys = delta
        .writes
        .iter()
        .map(TupleKey::from)
        .collect::<Vec<_>>();
      body.insert(
        String::from("writes"),
        json!({ "tuple_keys": keys }),
      );
    }
    if !delta.deletes.is_empty() {
      let keys = delta
        .deletes
        .iter()
        .map(TupleKey::from)
        .collect::<Vec<_>>();
      body.insert(
        String::from("deletes"),
        json!({ "tuple_keys": keys }),
      );
    }
    let _: Value = self.post("write", &Value::Object(body)).await?;
    Ok(())
  }

  pub async fn write_model(
    &self,
    model: &AuthorizationModel,
  ) -> anyhow::Result<()> {
    let _: Value = self
      .post("authorization-models", &translate_model(model))
      .await?;
    Ok(())
  }

  async fn post<B: Serialize, R: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> anyhow::Result<R> {
    let mut req = self
      .http
      .post(format!("{}/stores/{}/{path}", self.url, self.store))
      .json(body);
    if !self.token.is_empty() {
      req = req
        .header("authorization", format!("Bearer {}", self.token));
    }
    let res = req
      .send()
      .await
      .context("failed to reach relationship store")?;
    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      return Err(anyhow!(
        "relationship store returned {status} on /{path}: {text}"
      ));
    }
    res
      .json()
      .await
      .context("failed to parse relationship store response")
  }
}

/// The wire form of the projected model
/// (`POST /stores/{id}/authorization-models`).
fn translate_model(model: &AuthorizationModel) -> Value {
  let mut type_definitions = Vec::new();
  let type_names =
    model.types.keys().cloned().collect::<Vec<_>>();
  for (type_name, def) in &model.types {
    let mut relations = serde_json::Map::new();
    let mut metadata = serde_json::Map::new();
    for (relation, userset) in &def.relations {
      relations
        .insert(relation.clone(), translate_userset(userset));
      if contains_this(userset) {
        metadata.insert(
          relation.clone(),
          json!({
            "directly_related_user_types":
              direct_user_types(relation, &type_names),
          }),
        );
      }
    }
    type_definitions.push(json!({
      "type": type_name,
      "relations": relations,
      "metadata": { "relations": metadata },
    }));
  }
  json!({
    "schema_version": "1.1",
    "type_definitions": type_definitions,
  })
}

fn translate_userset(userset: &Userset) -> Value {
  match userset {
    Userset::This => json!({ "this": {} }),
    Userset::Computed(relation) => {
      json!({ "computedUserset": { "relation": relation } })
    }
    Userset::TupleTo { tupleset, computed } => json!({
      "tupleToUserset": {
        "tupleset": { "relation": tupleset },
        "computedUserset": { "relation": computed },
      },
    }),
    Userset::Union(children) => json!({
      "union": {
        "child":
          children.iter().map(translate_userset).collect::<Vec<_>>(),
      },
    }),
    Userset::Intersection(children) => json!({
      "intersection": {
        "child":
          children.iter().map(translate_userset).collect::<Vec<_>>(),
      },
    }),
  }
}

fn contains_this(userset: &Userset) -> bool {
  match userset {
    Userset::This => true,
    Userset::Computed(_) | Userset::TupleTo { .. } => false,
    Userset::Union(children)
    | Userset::Intersection(children) => {
      children.iter().any(contains_this)
    }
  }
}

/// Which user types may be written directly on a relation. Derived
/// from the reserved relation names; permission relations are only
/// written with the `InternalUser:*` wildcard (on roles).
fn direct_user_types(
  relation: &str,
  type_names: &[String],
) -> Value {
  match relation {
    "parent" => Value::Array(
      type_names
        .iter()
        .map(|name| json!({ "type": name }))
        .collect(),
    ),
    ROLE_BINDING => json!([{ "type": ROLE_BINDING }]),
    INTERNAL_ROLE => json!([{ "type": INTERNAL_ROLE }]),
    INTERNAL_USER => json!([
      { "type": INTERNAL_USER },
      { "type": INTERNAL_USER, "wildcard": {} },
    ]),
    _ => json!([{ "type": INTERNAL_USER, "wildcard": {} }]),
  }
}
