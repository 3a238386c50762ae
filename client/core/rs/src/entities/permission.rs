use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// A qualified permission: `{service}/{plural}.{verb}`,
/// eg. `library.example.com/books.checkout`.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Permission {
  pub service: String,
  pub plural: String,
  pub verb: String,
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}.{}", self.service, self.plural, self.verb)
  }
}

impl FromStr for Permission {
  type Err = anyhow::Error;
  fn from_str(permission: &str) -> Result<Permission, Self::Err> {
    let (service, rest) =
      permission.split_once('/').ok_or_else(|| {
        anyhow!(
          "invalid permission '{permission}': expected {{service}}/{{plural}}.{{verb}}"
        )
      })?;
    let (plural, verb) = rest.rsplit_once('.').ok_or_else(|| {
      anyhow!(
        "invalid permission '{permission}': expected {{service}}/{{plural}}.{{verb}}"
      )
    })?;
    if service.is_empty() || plural.is_empty() || verb.is_empty() {
      return Err(anyhow!(
        "invalid permission '{permission}': empty component"
      ));
    }
    Ok(Permission {
      service: String::from(service),
      plural: String::from(plural),
      verb: String::from(verb),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_qualified_permissions() {
    let permission: Permission =
      "library.example.com/books.checkout".parse().unwrap();
    assert_eq!(permission.service, "library.example.com");
    assert_eq!(permission.plural, "books");
    assert_eq!(permission.verb, "checkout");
    assert_eq!(
      permission.to_string(),
      "library.example.com/books.checkout"
    );
  }

  #[test]
  fn rejects_malformed_permissions() {
    assert!("books.checkout".parse::<Permission>().is_err());
    assert!("library/books".parse::<Permission>().is_err());
    assert!("library/.checkout".parse::<Permission>().is_err());
  }
}
