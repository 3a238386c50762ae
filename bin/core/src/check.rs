use reqwest::StatusCode;
use serror::AddStatusCodeError;
use warden_client::entities::{
  permission::Permission,
  reference::{ParentRelationship, ROOT_TYPE, ResourceReference},
  tuple::{
    RELATION_PARENT, Tuple, internal_user, object_id, root_object,
    tuple_type,
  },
};

use crate::{
  reconcile::perm_hash,
  relationship::{CheckQuery, RelationshipStore},
  schema::{
    DbServiceSource, SchemaRegistry, ServiceSource,
    parent::ParentResolverRegistry,
    subject::{
      DatabaseSubjectResolver, DbPrincipalSource, ResolveSubject,
    },
  },
  state,
};

/// Orchestrates a permission check: subject canonicalization, url
/// resolution, contextual parent assembly, backend check.
pub struct CheckEngine<'a, S: ServiceSource, R: ResolveSubject> {
  pub schema: &'a SchemaRegistry<S>,
  pub parents: &'a ParentResolverRegistry,
  pub store: &'a RelationshipStore,
  pub subjects: &'a R,
}

pub struct CheckOutcome {
  pub allowed: bool,
  pub reference: ResourceReference,
}

/// The engine over the production statics.
pub fn engine() -> CheckEngine<
  'static,
  DbServiceSource,
  DatabaseSubjectResolver<DbPrincipalSource>,
> {
  CheckEngine {
    schema: state::schema_registry(),
    parents: state::parent_resolvers(),
    store: state::relationship_store(),
    subjects: state::subject_resolver(),
  }
}

impl<S: ServiceSource, R: ResolveSubject> CheckEngine<'_, S, R> {
  /// May `subject` exercise `permission` on `resource`?
  ///
  /// Parent relationships come from the caller context when
  /// supplied; with an empty context the engine walks the registered
  /// parent resolvers instead. Either way the hierarchy reaches the
  /// store only as contextual tuples on this one query.
  ///
  /// A clean deny returns `allowed: false`. Mapping a deny to
  /// PERMISSION_DENIED is the outer service boundary's business, not
  /// this engine's.
  pub async fn check_access(
    &self,
    subject: &str,
    permission: &str,
    resource: &str,
    context: &[ParentRelationship],
    method: &str,
  ) -> serror::Result<CheckOutcome> {
    let principal = self.subjects.resolve(subject).await?;
    let reference = self.schema.resolve(resource).await?;
    permission
      .parse::<Permission>()
      .map_err(|e| e.status_code(StatusCode::BAD_REQUEST))?;

    let mut contextual_tuples = Vec::new();
    if !reference.is_root() {
      // Every resource is a child of its type's root object, so
      // global bindings reach it.
      contextual_tuples.push(Tuple::new(
        root_object(&reference.resource_type),
        RELATION_PARENT,
        object_id(&reference),
      ));
    }

    let walked;
    let context = if context.is_empty() {
      walked = self.parents.chain(self.schema, &reference).await?;
      walked.as_slice()
    } else {
      context
    };
    for hop in context {
      let parent_object = format!(
        "{}:{}",
        tuple_type(&hop.parent.resource_type),
        hop.parent.name
      );
      let child_object = format!(
        "{}:{}",
        tuple_type(&hop.child.resource_type),
        hop.child.name
      );
      contextual_tuples.push(Tuple::new(
        parent_object.clone(),
        RELATION_PARENT,
        child_object,
      ));
      if hop.parent.resource_type != ROOT_TYPE {
        contextual_tuples.push(Tuple::new(
          root_object(&hop.parent.resource_type),
          RELATION_PARENT,
          parent_object,
        ));
      }
    }

    let allowed = self
      .store
      .check(CheckQuery {
        user: internal_user(&principal),
        relation: perm_hash(permission),
        object: object_id(&reference),
        contextual_tuples,
      })
      .await?;

    let service = reference
      .self_link
      .split_once('/')
      .map(|(service, _)| service)
      .unwrap_or_default();
    info!(
      subject,
      resource = reference.self_link,
      permission,
      allowed,
      service,
      method,
      "access check"
    );

    Ok(CheckOutcome {
      allowed,
      reference,
    })
  }
}

#[cfg(test)]
mod tests {
  use warden_client::entities::reference::ResourceName;

  use crate::{
    fixtures::{
      MapRoleSource, MapServiceSource, library_service, role,
    },
    reconcile::{
      model::build_model,
      policy::{ResolvedBinding, project_policy},
      role::project_role,
    },
    relationship::MemoryStore,
    schema::subject::NoopSubjectResolver,
  };

  use super::*;

  const ADMIN: &str = "user:branch-admin@new-york.libraries";
  const RENTER: &str = "user:book-renter@example.com";
  const BRANCH: &str =
    "library.example.com/branches/central-park-new-york";
  const BOOK: &str =
    "library.example.com/branches/central-park-new-york/books/alice-in-wonderland";

  struct Harness {
    schema: SchemaRegistry<MapServiceSource>,
    parents: ParentResolverRegistry,
    store: RelationshipStore,
    subjects: NoopSubjectResolver,
  }

  impl Harness {
    async fn new() -> Harness {
      let store = RelationshipStore::Memory(MemoryStore::default());
      store
        .write_model(build_model(&[library_service()]))
        .await
        .unwrap();

      let roles = vec![
        role(
          "services/library.example.com/roles/library-admin",
          &[
            "library.example.com/branches.create",
            "library.example.com/branches.update",
            "library.example.com/branches.delete",
            "library.example.com/books.create",
            "library.example.com/books.delete",
          ],
          &[],
        ),
        role(
          "services/library.example.com/roles/book-renter",
          &[
            "library.example.com/books.checkout",
            "library.example.com/books.return",
          ],
          &[],
        ),
        role(
          "services/library.example.com/roles/super-renter",
          &[],
          &["services/library.example.com/roles/book-renter"],
        ),
      ];
      let source = MapRoleSource::new(roles.clone());
      for role in &roles {
        project_role(&source, &store, role).await.unwrap();
      }

      Harness {
        schema: SchemaRegistry::new(MapServiceSource::new(vec![
          library_service(),
        ])),
        parents: ParentResolverRegistry::new(),
        store,
        subjects: NoopSubjectResolver,
      }
    }

    fn engine(
      &self,
    ) -> CheckEngine<'_, MapServiceSource, NoopSubjectResolver>
    {
      CheckEngine {
        schema: &self.schema,
        parents: &self.parents,
        store: &self.store,
        subjects: &self.subjects,
      }
    }

    async fn bind(&self, resource: &str, role: &str, member: &str) {
      let target = self.schema.resolve(resource).await.unwrap();
      let principal = member
        .split_once(':')
        .map(|(_, id)| id)
        .unwrap_or("*");
      project_policy(
        &self.store,
        &target,
        &[ResolvedBinding {
          role: format!(
            "services/library.example.com/roles/{role}"
          ),
          principals: vec![String::from(principal)],
        }],
      )
      .await
      .unwrap();
    }

    async fn allowed(
      &self,
      subject: &str,
      permission: &str,
      resource: &str,
      context: &[ParentRelationship],
    ) -> bool {
      self
        .engine()
        .check_access(subject, permission, resource, context, "test")
        .await
        .unwrap()
        .allowed
    }
  }

  fn book_context() -> Vec<ParentRelationship> {
    vec![ParentRelationship {
      parent: ResourceName {
        resource_type: String::from("library.example.com/Branch"),
        name: String::from("branches/central-park-new-york"),
      },
      child: ResourceName {
        resource_type: String::from("library.example.com/Book"),
        name: String::from(
          "branches/central-park-new-york/books/alice-in-wonderland",
        ),
      },
    }]
  }

  #[tokio::test]
  async fn library_admin_grants_flow_down_the_branch() {
    let harness = Harness::new().await;
    harness.bind(BRANCH, "library-admin", ADMIN).await;

    assert!(
      harness
        .allowed(
          ADMIN,
          "library.example.com/branches.delete",
          BRANCH,
          &[],
        )
        .await
    );
    // The same subject may act on books beneath the branch, given
    // the parent relationship context.
    assert!(
      harness
        .allowed(
          ADMIN,
          "library.example.com/books.create",
          BOOK,
          &book_context(),
        )
        .await
    );
    // Without the parent context the grant does not reach the book.
    assert!(
      !harness
        .allowed(
          ADMIN,
          "library.example.com/books.create",
          BOOK,
          &[],
        )
        .await
    );
  }

  fn book_parent(
    reference: ResourceReference,
  ) -> futures::future::BoxFuture<
    'static,
    serror::Result<Option<ResourceReference>>,
  > {
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
  async fn engine_walks_registered_parents_without_context() {
    let mut harness = Harness::new().await;
    harness
      .parents
      .register("library.example.com/Book", book_parent);
    harness.bind(BRANCH, "library-admin", ADMIN).await;

    // No caller supplied context, the engine assembles the chain
    // itself.
    assert!(
      harness
        .allowed(
          ADMIN,
          "library.example.com/books.create",
          BOOK,
          &[],
        )
        .await
    );
  }

  #[tokio::test]
  async fn book_renter_is_scoped_to_the_book() {
    let harness = Harness::new().await;
    harness.bind(BOOK, "book-renter", RENTER).await;

    assert!(
      harness
        .allowed(
          RENTER,
          "library.example.com/books.checkout",
          BOOK,
          &book_context(),
        )
        .await
    );
    assert!(
      !harness
        .allowed(
          RENTER,
          "library.example.com/branches.delete",
          BRANCH,
          &[],
        )
        .await
    );
  }

  #[tokio::test]
  async fn inherited_roles_grant_their_closure_only() {
    let harness = Harness::new().await;
    harness.bind(BOOK, "super-renter", RENTER).await;

    assert!(
      harness
        .allowed(
          RENTER,
          "library.example.com/books.return",
          BOOK,
          &book_context(),
        )
        .await
    );
    assert!(
      !harness
        .allowed(
          RENTER,
          "library.example.com/books.create",
          BOOK,
          &book_context(),
        )
        .await
    );
  }

  #[tokio::test]
  async fn root_bindings_grant_across_the_type() {
    let harness = Harness::new().await;
    harness
      .bind(
        "iam/root/library.example.com/Branch",
        "library-admin",
        ADMIN,
      )
      .await;

    for branch in [
      BRANCH,
      "library.example.com/branches/astoria-queens",
    ] {
      assert!(
        harness
          .allowed(
            ADMIN,
            "library.example.com/branches.delete",
            branch,
            &[],
          )
          .await
      );
    }
    assert!(
      !harness
        .allowed(
          RENTER,
          "library.example.com/branches.delete",
          BRANCH,
          &[],
        )
        .await
    );
  }

  #[tokio::test]
  async fn all_authenticated_users_bindings_match_any_subject() {
    let harness = Harness::new().await;
    harness
      .bind(BOOK, "book-renter", "allAuthenticatedUsers")
      .await;

    assert!(
      harness
        .allowed(
          "user:anyone@example.com",
          "library.example.com/books.checkout",
          BOOK,
          &book_context(),
        )
        .await
    );
  }

  #[tokio::test]
  async fn malformed_inputs_are_invalid_argument() {
    let harness = Harness::new().await;
    let engine = harness.engine();
    assert!(
      engine
        .check_access(
          "not-a-subject",
          "library.example.com/books.checkout",
          BOOK,
          &[],
          "test",
        )
        .await
        .is_err()
    );
    assert!(
      engine
        .check_access(
          RENTER,
          "books.checkout",
          BOOK,
          &[],
          "test",
        )
        .await
        .is_err()
    );
    assert!(
      engine
        .check_access(
          RENTER,
          "library.example.com/books.checkout",
          "library.example.com/unknown/path/shape",
          &[],
          "test",
        )
        .await
        .is_err()
    );
  }
}
