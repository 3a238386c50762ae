use anyhow::{Context, anyhow};
use mongo_indexed::{create_index, create_unique_index};
use mungos::{
  init::MongoBuilder,
  mongodb::{Collection, Database},
};
use serde::{Deserialize, Serialize};
use warden_client::entities::{
  config::DatabaseConfig,
  policy::Policy,
  resource::{Resource, ResourceSpec},
  role::Role,
  service::Service,
  tenant::{Organization, Project},
  user::User,
};

pub use mongo_indexed;
pub use mungos;

pub mod cursor;

/// One collection per resource type, named
/// `{type FQN with '.' and '/' replaced by '_'}_resource`.
pub fn collection_name(type_fqn: &str) -> String {
  format!("{}_resource", type_fqn.replace(['.', '/'], "_"))
}

/// Storage row for a resource. `data` embeds the full message behind
/// a type tag, so readers can materialize the concrete type without
/// coupling to a per type schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stored<T> {
  /// UUID primary key.
  #[serde(rename = "_id")]
  pub uid: String,
  pub name: String,
  #[serde(default)]
  pub parent: String,
  pub data: TypedPayload<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedPayload<T> {
  #[serde(rename = "type")]
  pub type_url: String,
  pub value: T,
}

impl<S: ResourceSpec> Stored<Resource<S>> {
  pub fn wrap(resource: Resource<S>) -> Stored<Resource<S>> {
    Stored {
      uid: resource.uid.clone(),
      name: resource.name.clone(),
      parent: resource.parent.clone(),
      data: TypedPayload {
        type_url: String::from(S::TYPE),
        value: resource,
      },
    }
  }

  pub fn into_inner(self) -> Resource<S> {
    self.data.value
  }
}

#[derive(Debug)]
pub struct Client {
  pub services: Collection<Stored<Service>>,
  pub roles: Collection<Stored<Role>>,
  pub policies: Collection<Stored<Policy>>,
  pub users: Collection<Stored<User>>,
  pub organizations: Collection<Stored<Organization>>,
  pub projects: Collection<Stored<Project>>,
  //
  pub db: Database,
}

impl Client {
  pub async fn new(
    config: &DatabaseConfig,
  ) -> anyhow::Result<Client> {
    let db = init(config).await?;
    Self::from_database(db).await
  }

  pub async fn from_database(db: Database) -> anyhow::Result<Client> {
    let client = Client {
      services: resource_collection(&db).await?,
      roles: resource_collection(&db).await?,
      policies: resource_collection(&db).await?,
      users: resource_collection(&db).await?,
      organizations: resource_collection(&db).await?,
      projects: resource_collection(&db).await?,
      //
      db,
    };
    Ok(client)
  }
}

/// Initializes unindexed database handle.
pub async fn init(
  DatabaseConfig {
    uri,
    address,
    username,
    password,
    app_name,
    db_name,
  }: &DatabaseConfig,
) -> anyhow::Result<Database> {
  let mut client = MongoBuilder::default().app_name(app_name);

  match (
    !uri.is_empty(),
    !address.is_empty(),
    !username.is_empty(),
    !password.is_empty(),
  ) {
    (true, _, _, _) => {
      client = client.uri(uri);
    }
    (_, true, true, true) => {
      client = client
        .address(address)
        .username(username)
        .password(password);
    }
    (_, true, _, _) => {
      client = client.address(address);
    }
    _ => {
      return Err(anyhow!(
        "'config.database' not configured correctly. must pass either 'config.database.uri', or 'config.database.address' + 'config.database.username' + 'config.database.password'"
      ));
    }
  }

  let client = client
    .build()
    .await
    .context("Failed to initialize database connection.")?;

  Ok(client.database(db_name))
}

async fn resource_collection<S: ResourceSpec>(
  db: &Database,
) -> anyhow::Result<Collection<Stored<Resource<S>>>> {
  let coll = db
    .collection::<Stored<Resource<S>>>(&collection_name(S::TYPE));

  create_unique_index(&coll, "name").await?;

  create_index(&coll, "parent").await?;

  Ok(coll)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collection_names_replace_separators() {
    assert_eq!(collection_name("iam/Service"), "iam_Service_resource");
    assert_eq!(
      collection_name("library.example.com/Book"),
      "library_example_com_Book_resource"
    );
  }
}
