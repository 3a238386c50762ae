use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// The synthetic universal ancestor type. Every declared resource
/// type is a child of it, so bindings on `iam/root/{type}` grant
/// across all objects of that type.
pub const ROOT_TYPE: &str = "iam/Root";

/// Resource URL prefix resolving to the synthetic root.
pub const ROOT_URL_PREFIX: &str = "iam/root";

/// A resolved, typed reference to a resource named by URL.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ResourceReference {
  /// Fully qualified type, eg. `library.example.com/Book`.
  #[serde(rename = "type")]
  pub resource_type: String,

  /// Path form name without the service prefix,
  /// eg. `branches/central-park/books/alice`.
  pub name: String,

  /// `{service}/{name}` - the resource URL this reference resolved
  /// from.
  #[serde(default)]
  pub self_link: String,
}

impl ResourceReference {
  pub fn new(
    resource_type: impl Into<String>,
    name: impl Into<String>,
  ) -> ResourceReference {
    let resource_type = resource_type.into();
    let name = name.into();
    let service = resource_type
      .split_once('/')
      .map(|(service, _)| service)
      .unwrap_or(resource_type.as_str());
    let self_link = format!("{service}/{name}");
    ResourceReference {
      resource_type,
      name,
      self_link,
    }
  }

  /// The synthetic root reference. With a type suffix the reference
  /// names the per type root object (`root/{type}`), which global
  /// bindings attach to.
  pub fn root(type_suffix: Option<&str>) -> ResourceReference {
    let name = match type_suffix {
      Some(suffix) => format!("root/{suffix}"),
      None => String::from("root"),
    };
    ResourceReference {
      resource_type: String::from(ROOT_TYPE),
      self_link: format!("iam/{name}"),
      name,
    }
  }

  pub fn is_root(&self) -> bool {
    self.resource_type == ROOT_TYPE
  }
}

/// A `(type, name)` pair as supplied in caller context.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ResourceName {
  #[serde(rename = "type")]
  pub resource_type: String,
  pub name: String,
}

/// One hop of resource hierarchy supplied with a check request.
#[typeshare]
#[derive(
  Debug, Clone, Default, PartialEq, Serialize, Deserialize,
)]
pub struct ParentRelationship {
  pub parent: ResourceName,
  pub child: ResourceName,
}
