use std::sync::OnceLock;

use crate::{
  auth::SubjectExtractor,
  config::core_config,
  relationship::RelationshipStore,
  schema::{
    DbServiceSource, SchemaRegistry,
    parent::{ParentResolverRegistry, default_registry},
    subject::{DatabaseSubjectResolver, DbPrincipalSource},
  },
};

static DB_CLIENT: OnceLock<database::Client> = OnceLock::new();

pub async fn init_db_client() {
  let client = database::Client::new(&core_config().database)
    .await
    .expect("failed to initialize database client");
  DB_CLIENT
    .set(client)
    .expect("db client initialized more than once");
}

pub fn db_client() -> &'static database::Client {
  DB_CLIENT.get().expect("db client not yet initialized")
}

pub fn relationship_store() -> &'static RelationshipStore {
  static RELATIONSHIP_STORE: OnceLock<RelationshipStore> =
    OnceLock::new();
  RELATIONSHIP_STORE.get_or_init(|| {
    RelationshipStore::from_config(&core_config().relationship)
      .expect("failed to initialize relationship store")
  })
}

pub fn schema_registry() -> &'static SchemaRegistry<DbServiceSource>
{
  static SCHEMA_REGISTRY: OnceLock<
    SchemaRegistry<DbServiceSource>,
  > = OnceLock::new();
  SCHEMA_REGISTRY
    .get_or_init(|| SchemaRegistry::new(DbServiceSource))
}

pub fn parent_resolvers() -> &'static ParentResolverRegistry {
  static PARENT_RESOLVERS: OnceLock<ParentResolverRegistry> =
    OnceLock::new();
  PARENT_RESOLVERS.get_or_init(default_registry)
}

pub fn subject_resolver()
-> &'static DatabaseSubjectResolver<DbPrincipalSource> {
  static SUBJECT_RESOLVER: OnceLock<
    DatabaseSubjectResolver<DbPrincipalSource>,
  > = OnceLock::new();
  SUBJECT_RESOLVER
    .get_or_init(|| DatabaseSubjectResolver(DbPrincipalSource))
}

pub fn subject_extractor() -> &'static SubjectExtractor {
  static SUBJECT_EXTRACTOR: OnceLock<SubjectExtractor> =
    OnceLock::new();
  SUBJECT_EXTRACTOR.get_or_init(|| {
    SubjectExtractor::from_config(&core_config().auth)
      .expect("failed to initialize subject extractor")
  })
}
