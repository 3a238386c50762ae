use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use strum::Display;
use typeshare::typeshare;

/// The member string granting to every authenticated subject.
pub const ALL_AUTHENTICATED_USERS: &str = "allAuthenticatedUsers";

/// The wildcard principal id `allAuthenticatedUsers` parses to.
pub const WILDCARD_PRINCIPAL: &str = "*";

#[typeshare]
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
)]
pub enum SubjectKind {
  #[default]
  User,
  ServiceAccount,
}

/// A parsed subject / policy member.
///
/// Accepted forms: `allAuthenticatedUsers`, `user:{id}`,
/// `serviceAccount:{id}`. Anything else (including `group:`, which
/// the member grammar reserves but resolution does not support yet)
/// is invalid.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Subject {
  pub kind: SubjectKind,
  /// External identifier, or `*` for `allAuthenticatedUsers`.
  pub id: String,
}

impl Subject {
  pub fn is_wildcard(&self) -> bool {
    self.id == WILDCARD_PRINCIPAL
  }
}

impl FromStr for Subject {
  type Err = anyhow::Error;
  fn from_str(subject: &str) -> Result<Subject, Self::Err> {
    if subject == ALL_AUTHENTICATED_USERS {
      return Ok(Subject {
        kind: SubjectKind::User,
        id: String::from(WILDCARD_PRINCIPAL),
      });
    }
    let (kind, id) = subject
      .split_once(':')
      .ok_or_else(|| anyhow!("invalid subject '{subject}'"))?;
    if id.is_empty() {
      return Err(anyhow!("invalid subject '{subject}': empty id"));
    }
    let kind = match kind {
      "user" => SubjectKind::User,
      "serviceAccount" => SubjectKind::ServiceAccount,
      _ => {
        return Err(anyhow!(
          "invalid subject '{subject}': unsupported kind '{kind}'"
        ));
      }
    };
    Ok(Subject {
      kind,
      id: String::from(id),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_supported_subject_forms() {
    let all: Subject = ALL_AUTHENTICATED_USERS.parse().unwrap();
    assert!(all.is_wildcard());
    assert_eq!(all.kind, SubjectKind::User);

    let user: Subject = "user:renter@example.com".parse().unwrap();
    assert_eq!(user.kind, SubjectKind::User);
    assert_eq!(user.id, "renter@example.com");

    let sa: Subject = "serviceAccount:ci@bots".parse().unwrap();
    assert_eq!(sa.kind, SubjectKind::ServiceAccount);
  }

  #[test]
  fn rejects_unsupported_subject_forms() {
    assert!("group:devs@example.com".parse::<Subject>().is_err());
    assert!("renter@example.com".parse::<Subject>().is_err());
    assert!("user:".parse::<Subject>().is_err());
  }
}
