use anyhow::{Context, anyhow};
use reqwest::StatusCode;
use serror::AddStatusCodeError;
use warden_client::entities::subject::{
  Subject, WILDCARD_PRINCIPAL,
};

use crate::resource;

/// Lookup of internal principal names by external identifier.
pub trait PrincipalSource: Send + Sync {
  fn principal_by_email(
    &self,
    email: &str,
  ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

pub struct DbPrincipalSource;

impl PrincipalSource for DbPrincipalSource {
  async fn principal_by_email(
    &self,
    email: &str,
  ) -> anyhow::Result<Option<String>> {
    let user = resource::user_by_email(email)
      .await
      .map_err(|e| e.error)?;
    Ok(user.map(|user| user.name))
  }
}

/// Canonicalizes a combined subject id (`user:{id}` etc.) into the
/// internal principal name used inside relationship tuples.
pub trait ResolveSubject: Send + Sync {
  fn resolve(
    &self,
    combined_id: &str,
  ) -> impl Future<Output = serror::Result<String>> + Send;
}

fn parse(combined_id: &str) -> serror::Result<Subject> {
  combined_id
    .parse::<Subject>()
    .map_err(|e| e.status_code(StatusCode::BAD_REQUEST))
}

/// Maps `(kind, id)` to the stored User whose email matches, and
/// answers with that resource's name.
pub struct DatabaseSubjectResolver<P>(pub P);

impl<P: PrincipalSource> ResolveSubject
  for DatabaseSubjectResolver<P>
{
  async fn resolve(
    &self,
    combined_id: &str,
  ) -> serror::Result<String> {
    let subject = parse(combined_id)?;
    if subject.is_wildcard() {
      return Ok(String::from(WILDCARD_PRINCIPAL));
    }
    let principal = self
      .0
      .principal_by_email(&subject.id)
      .await
      .context("failed to resolve subject against the store")?;
    match principal {
      Some(principal) => Ok(principal),
      None => Err(
        anyhow!(
          "no {} found with identifier '{}'",
          subject.kind,
          subject.id
        )
        .status_code(StatusCode::NOT_FOUND),
      ),
    }
  }
}

/// Returns the parsed id verbatim. Tests and admin tooling.
pub struct NoopSubjectResolver;

impl ResolveSubject for NoopSubjectResolver {
  async fn resolve(
    &self,
    combined_id: &str,
  ) -> serror::Result<String> {
    Ok(parse(combined_id)?.id)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  struct MapPrincipals(HashMap<String, String>);

  impl PrincipalSource for MapPrincipals {
    async fn principal_by_email(
      &self,
      email: &str,
    ) -> anyhow::Result<Option<String>> {
      Ok(self.0.get(email).cloned())
    }
  }

  #[tokio::test]
  async fn database_resolver_maps_emails_to_principals() {
    let resolver = DatabaseSubjectResolver(MapPrincipals(
      HashMap::from([(
        String::from("renter@example.com"),
        String::from("users/0000-1111"),
      )]),
    ));
    assert_eq!(
      resolver.resolve("user:renter@example.com").await.unwrap(),
      "users/0000-1111"
    );
    assert_eq!(
      resolver.resolve("allAuthenticatedUsers").await.unwrap(),
      "*"
    );
    let missing =
      resolver.resolve("user:ghost@example.com").await;
    assert!(missing.is_err());
  }

  #[tokio::test]
  async fn noop_resolver_passes_ids_through() {
    let resolver = NoopSubjectResolver;
    assert_eq!(
      resolver.resolve("user:renter@example.com").await.unwrap(),
      "renter@example.com"
    );
    assert!(resolver.resolve("group:devs").await.is_err());
  }
}
