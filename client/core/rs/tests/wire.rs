//! The JSON forms of the entities are the wire contract between the
//! client, the core server, and the rows it persists. These pin the
//! shapes so refactors cannot drift them silently.

use serde_json::{Value, json};
use warden_client::entities::{
  operation::Operation,
  policy::{Binding, Policy, PolicySpec},
  reference::ResourceReference,
  service::{ResourceDef, Service, ServiceSpec},
  tuple::{Tuple, object_id, root_object},
};

#[test]
fn service_wire_form_uses_declared_field_names() {
  let service = Service {
    name: String::from("services/library.example.com"),
    spec: ServiceSpec {
      service_id: String::from("library.example.com"),
      resources: vec![ResourceDef {
        resource_type: String::from("library.example.com/Branch"),
        singular: String::from("branch"),
        plural: String::from("branches"),
        permissions: vec![String::from("delete")],
        resource_name_patterns: vec![String::from(
          "branches/{branch}",
        )],
        parent_resources: vec![],
      }],
    },
    ..Default::default()
  };
  let value = serde_json::to_value(&service).unwrap();
  // the type discriminator serializes as `type`
  assert_eq!(
    value["spec"]["resources"][0]["type"],
    json!("library.example.com/Branch")
  );
  // unset server managed fields stay off the wire
  assert!(value.get("uid").is_none());
  assert!(value.get("etag").is_none());
  // zero timestamps serialize (they mark the live state)
  assert_eq!(value["delete_time"], json!(0));
}

#[test]
fn policies_round_trip() {
  let policy = Policy {
    name: String::from(
      "library.example.com/branches/central-park-new-york",
    ),
    spec: PolicySpec {
      bindings: vec![Binding {
        role: String::from(
          "services/library.example.com/roles/library-admin",
        ),
        members: vec![
          String::from(
            "user:branch-admin@new-york.libraries",
          ),
          String::from("allAuthenticatedUsers"),
        ],
      }],
    },
    ..Default::default()
  };
  let value = serde_json::to_value(&policy).unwrap();
  let parsed: Policy = serde_json::from_value(value).unwrap();
  assert_eq!(parsed, policy);
}

#[test]
fn operations_carry_their_response_inline() {
  let operation = Operation::completed(json!({ "ok": true }));
  assert!(operation.done);
  assert!(operation.name.starts_with("operations/"));
  let value = serde_json::to_value(&operation).unwrap();
  assert_eq!(value["response"]["ok"], json!(true));
  // unset metadata stays off the wire
  assert!(value.get("metadata").is_none());
}

#[test]
fn tuple_object_ids_take_the_reserved_forms() {
  let branch = ResourceReference::new(
    "library.example.com/Branch",
    "branches/central-park-new-york",
  );
  assert_eq!(
    object_id(&branch),
    "library.example.com/Branch:branches/central-park-new-york"
  );
  assert_eq!(
    branch.self_link,
    "library.example.com/branches/central-park-new-york"
  );
  assert_eq!(
    root_object("library.example.com/Branch"),
    "Root:root/library.example.com/Branch"
  );
  let root = ResourceReference::root(Some(
    "library.example.com/Branch",
  ));
  assert_eq!(
    object_id(&root),
    "Root:root/library.example.com/Branch"
  );

  let tuple: Value = serde_json::to_value(Tuple::new(
    "InternalUser:*",
    "InternalUser",
    "RoleBinding:b0123",
  ))
  .unwrap();
  assert_eq!(
    tuple,
    json!({
      "user": "InternalUser:*",
      "relation": "InternalUser",
      "object": "RoleBinding:b0123",
    })
  );
}
