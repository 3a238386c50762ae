use std::sync::OnceLock;

use anyhow::anyhow;
use regex::Regex;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use serror::AddStatusCodeError;
use warden_client::entities::{
  permission::Permission,
  resource::{Resource, ResourceSpec},
  service::Service,
};

use crate::schema::{ServiceSource, subject::ResolveSubject};

pub const MAX_DISPLAY_NAME_LEN: usize = 150;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct FieldViolation {
  pub field: String,
  pub description: String,
}

/// Accumulates field violations across every rule before failing, so
/// one response enumerates everything wrong with the request.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
  pub fn new() -> Violations {
    Default::default()
  }

  pub fn push(
    &mut self,
    field: impl Into<String>,
    description: impl Into<String>,
  ) {
    self.0.push(FieldViolation {
      field: field.into(),
      description: description.into(),
    });
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// INVALID_ARGUMENT listing every violation, with the structured
  /// list appended as a JSON trailer for transcoding gateways.
  pub fn into_result(self) -> serror::Result<()> {
    if self.0.is_empty() {
      return Ok(());
    }
    let mut message = format!(
      "request validation failed with {} violation(s)",
      self.0.len()
    );
    for FieldViolation { field, description } in &self.0 {
      message.push_str(&format!("\n- {field}: {description}"));
    }
    // serialization of FieldViolation cannot fail
    message.push_str(&format!(
      "\n{}",
      serde_json::to_string(&self.0).unwrap()
    ));
    Err(anyhow!(message).status_code(StatusCode::BAD_REQUEST))
  }
}

fn dns_label_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new("^[a-z]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap()
  })
}

fn permission_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^([A-Za-z0-9.\-]+)/([A-Za-z.\-]+)\.([A-Za-z]+)$",
    )
    .unwrap()
  })
}

/// A single lowercase DNS label, eg `book-renter`.
pub fn dns_label(
  violations: &mut Violations,
  field: &str,
  value: &str,
) {
  if !dns_label_regex().is_match(value) {
    violations.push(
      field,
      format!("'{value}' is not a valid DNS label"),
    );
  }
}

/// A DNS name: one or more labels joined by dots,
/// eg `library.example.com`.
pub fn dns_name(
  violations: &mut Violations,
  field: &str,
  value: &str,
) {
  if value.is_empty()
    || !value.split('.').all(|label| {
      dns_label_regex().is_match(label)
    })
  {
    violations.push(
      field,
      format!("'{value}' is not a valid DNS name"),
    );
  }
}

/// Display name / description length bounds shared by all kinds.
pub fn common_fields<S: ResourceSpec>(
  violations: &mut Violations,
  resource: &Resource<S>,
) {
  if resource.display_name.len() > MAX_DISPLAY_NAME_LEN {
    violations.push(
      "display_name",
      format!("must be at most {MAX_DISPLAY_NAME_LEN} characters"),
    );
  }
  if resource.description.len() > MAX_DESCRIPTION_LEN {
    violations.push(
      "description",
      format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
    );
  }
}

/// Service declarations: id grammar, type prefixes, verb grammar.
pub fn service_spec(
  violations: &mut Violations,
  service: &Service,
) {
  dns_name(violations, "spec.service_id", &service.spec.service_id);
  let prefix = format!("{}/", service.spec.service_id);
  for (i, def) in service.spec.resources.iter().enumerate() {
    let field = format!("spec.resources[{i}]");
    if !def.resource_type.starts_with(&prefix) {
      violations.push(
        format!("{field}.type"),
        format!(
          "type '{}' must begin with the service id '{}'",
          def.resource_type, service.spec.service_id
        ),
      );
    }
    if def.plural.is_empty() {
      violations
        .push(format!("{field}.plural"), "must not be empty");
    }
    for (j, verb) in def.permissions.iter().enumerate() {
      if verb.is_empty()
        || !verb.chars().all(|c| c.is_ascii_alphabetic())
      {
        violations.push(
          format!("{field}.permissions[{j}]"),
          format!("verb '{verb}' must match [A-Za-z]+"),
        );
      }
    }
    for (j, pattern) in
      def.resource_name_patterns.iter().enumerate()
    {
      if pattern.is_empty()
        || pattern.starts_with('/')
        || pattern.ends_with('/')
      {
        violations.push(
          format!("{field}.resource_name_patterns[{j}]"),
          "patterns must be non-empty and not start or end with '/'",
        );
      }
    }
  }
}

/// Each permission must match the qualified grammar, name a known
/// service, and exist in that service's declared catalog.
pub async fn permissions_exist<S: ServiceSource>(
  source: &S,
  violations: &mut Violations,
  prefix: &str,
  permissions: &[String],
) -> serror::Result<()> {
  for (i, permission) in permissions.iter().enumerate() {
    let field = format!("{prefix}[{i}]");
    if !permission_regex().is_match(permission) {
      violations.push(
        field,
        format!(
          "'{permission}' must match {{service}}/{{plural}}.{{verb}}"
        ),
      );
      continue;
    }
    // grammar checked above, parse cannot fail
    let parsed: Permission = permission.parse().unwrap();
    let Some(service) =
      source.fetch_service(&parsed.service).await.map_err(|e| {
        e.context("failed to fetch service for permission check")
      })?
    else {
      violations.push(
        field,
        format!("unknown service '{}'", parsed.service),
      );
      continue;
    };
    let declared = service.spec.resources.iter().any(|def| {
      def.plural == parsed.plural
        && def.permissions.contains(&parsed.verb)
    });
    if !declared {
      violations.push(
        field,
        format!(
          "service '{}' does not declare permission '{}.{}'",
          parsed.service, parsed.plural, parsed.verb
        ),
      );
    }
  }
  Ok(())
}

/// Parse and canonicalize policy members. Violations cover both
/// grammar failures and unresolvable (unknown) subjects; resolved
/// principal ids come back for the projection.
pub async fn resolve_members<R: ResolveSubject>(
  resolver: &R,
  violations: &mut Violations,
  prefix: &str,
  members: &[String],
) -> Vec<String> {
  let mut principals = Vec::with_capacity(members.len());
  for (i, member) in members.iter().enumerate() {
    match resolver.resolve(member).await {
      Ok(principal) => principals.push(principal),
      Err(e) => violations.push(
        format!("{prefix}[{i}]"),
        format!("{:#}", e.error),
      ),
    }
  }
  principals
}

/// Merge `updated` into `existing` under the field mask, then reject
/// any change to an immutable path.
///
/// An empty mask applies every mutable field. The returned resource
/// carries the caller's etag (empty skips the compare-and-swap).
pub fn apply_update<S: ResourceSpec>(
  existing: &Resource<S>,
  updated: &Resource<S>,
  update_mask: &[String],
  immutable: &[&str],
) -> serror::Result<Resource<S>> {
  let mut violations = Violations::new();

  // serde_json round trip of plain data types cannot fail
  let existing_value = serde_json::to_value(existing).unwrap();
  let updated_value = serde_json::to_value(updated).unwrap();
  let mut merged = existing_value.clone();

  if update_mask.is_empty() {
    for field in ["display_name", "description", "spec"] {
      if let Some(value) = updated_value.get(field) {
        merged[field] = value.clone();
      }
    }
  } else {
    for path in update_mask {
      let root = path.split('.').next().unwrap_or(path);
      if !matches!(
        root,
        "display_name" | "description" | "spec"
      ) {
        violations.push(
          path.clone(),
          "field is not updatable through the mask",
        );
        continue;
      }
      match value_at(&updated_value, path) {
        Some(value) => {
          if !set_at(&mut merged, path, value.clone()) {
            violations
              .push(path.clone(), "unknown field path");
          }
        }
        None => {
          violations.push(path.clone(), "unknown field path");
        }
      }
    }
  }

  for path in immutable {
    if value_at(&existing_value, path) != value_at(&merged, path) {
      violations.push(*path, "field is immutable");
    }
  }

  violations.into_result()?;

  let mut merged: Resource<S> = serde_json::from_value(merged)
    .map_err(|e| {
      anyhow!(e).context("failed to materialize updated resource")
    })?;
  merged.etag = updated.etag.clone();
  Ok(merged)
}

fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
  let mut current = value;
  for segment in path.split('.') {
    current = current.get(segment)?;
  }
  Some(current)
}

fn set_at(target: &mut Value, path: &str, value: Value) -> bool {
  let mut current = target;
  let segments = path.split('.').collect::<Vec<_>>();
  let (last, rest) = match segments.split_last() {
    Some(split) => split,
    None => return false,
  };
  for segment in rest {
    match current.get_mut(*segment) {
      Some(next) => current = next,
      None => return false,
    }
  }
  match current.as_object_mut() {
    Some(object) => {
      object.insert(String::from(*last), value);
      true
    }
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use warden_client::entities::role::{Role, RoleSpec};

  use crate::fixtures::{MapServiceSource, library_service};
  use crate::schema::subject::NoopSubjectResolver;

  use super::*;

  #[test]
  fn violations_enumerate_every_failure() {
    let mut violations = Violations::new();
    dns_label(&mut violations, "spec.role_id", "Not-A-Label!");
    dns_label(&mut violations, "spec.other_id", "ok-label");
    dns_name(
      &mut violations,
      "spec.service_id",
      "library..example.com",
    );
    assert_eq!(violations.len(), 2);
    let err = violations.into_result().unwrap_err();
    let message = format!("{:#}", err.error);
    assert!(message.contains("spec.role_id"));
    assert!(message.contains("spec.service_id"));
    assert!(message.contains("2 violation(s)"));
  }

  #[tokio::test]
  async fn permission_catalog_is_enforced() {
    let source = MapServiceSource::new(vec![library_service()]);
    let mut violations = Violations::new();
    permissions_exist(
      &source,
      &mut violations,
      "spec.included_permissions",
      &[
        String::from("library.example.com/books.checkout"),
        String::from("not-a-permission"),
        String::from("printing/presses.operate"),
        String::from("library.example.com/books.burn"),
      ],
    )
    .await
    .unwrap();
    assert_eq!(violations.len(), 3);
  }

  #[tokio::test]
  async fn group_members_are_rejected() {
    let mut violations = Violations::new();
    let principals = resolve_members(
      &NoopSubjectResolver,
      &mut violations,
      "spec.bindings[0].members",
      &[
        String::from("user:renter@example.com"),
        String::from("group:devs@example.com"),
        String::from("allAuthenticatedUsers"),
      ],
    )
    .await;
    assert_eq!(violations.len(), 1);
    assert_eq!(principals, vec!["renter@example.com", "*"]);
  }

  #[test]
  fn update_mask_rejects_immutable_changes() {
    let existing = Role {
      name: String::from(
        "services/library.example.com/roles/book-renter",
      ),
      spec: RoleSpec {
        role_id: String::from("book-renter"),
        included_permissions: vec![String::from(
          "library.example.com/books.checkout",
        )],
        inherited_roles: vec![],
      },
      ..Default::default()
    };
    let mut updated = existing.clone();
    updated.spec.role_id = String::from("renamed");

    let err = apply_update(
      &existing,
      &updated,
      &[String::from("spec.role_id")],
      <Role as crate::resource::WardenResource>::IMMUTABLE_FIELDS,
    )
    .unwrap_err();
    assert!(
      format!("{:#}", err.error).contains("spec.role_id")
    );
  }

  #[test]
  fn update_mask_applies_only_named_fields() {
    let existing = Role {
      name: String::from(
        "services/library.example.com/roles/book-renter",
      ),
      description: String::from("old"),
      ..Default::default()
    };
    let mut updated = existing.clone();
    updated.description = String::from("new");
    updated.display_name = String::from("should not apply");

    let merged = apply_update(
      &existing,
      &updated,
      &[String::from("description")],
      &[],
    )
    .unwrap();
    assert_eq!(merged.description, "new");
    assert_eq!(merged.display_name, "");

    // unmaskable fields are refused
    assert!(
      apply_update(
        &existing,
        &updated,
        &[String::from("uid")],
        &[],
      )
      .is_err()
    );
  }
}
