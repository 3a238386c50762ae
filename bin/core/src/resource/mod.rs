use anyhow::{Context, anyhow};
use database::{
  Stored,
  cursor::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageCursor},
};
use mungos::{
  find::find_collect,
  mongodb::{
    Collection,
    bson::{Document, doc},
    options::FindOptions,
  },
};
use reqwest::StatusCode;
use serror::AddStatusCodeError;
use uuid::Uuid;
use warden_client::entities::{
  resource::{Resource, ResourceSpec},
  warden_timestamp,
};

use crate::helpers::new_etag;

mod policy;
mod role;
mod service;
mod tenant;
mod user;

pub use policy::policy_for;
pub use role::{role_is_referenced, roles_inheriting};
pub use user::user_by_email;

/// Implement on each stored Warden resource kind for the common
/// store methods.
pub trait WardenResource: Sized + Send + Sync {
  type Spec: ResourceSpec;

  /// Kind name for logs / errors, eg `Service`.
  fn kind() -> &'static str;

  fn coll() -> &'static Collection<Stored<Resource<Self::Spec>>>;

  fn resource_type() -> &'static str {
    Self::Spec::TYPE
  }

  /// Per page cap for List. Users raise this to 1000.
  const MAX_PAGE_SIZE: i64 = MAX_PAGE_SIZE;

  /// Field paths rejected when an update changes them.
  const IMMUTABLE_FIELDS: &'static [&'static str] = &[];

  /// Declared parent type of the stored kind, if any.
  const PARENT_TYPE: Option<&'static str> = None;
}

// ======
// GET
// ======

/// Returns the resource (soft deleted included, with `delete_time`
/// set) or NOT_FOUND.
#[instrument(
  level = "debug",
  skip_all,
  fields(
    resource_type = T::resource_type(),
    resource_name = name,
  )
)]
pub async fn get<T: WardenResource>(
  name: &str,
) -> serror::Result<Resource<T::Spec>> {
  match get_optional::<T>(name).await? {
    Some(resource) => Ok(resource),
    None => Err(
      anyhow!("did not find any {} matching {name}", T::kind())
        .status_code(StatusCode::NOT_FOUND),
    ),
  }
}

/// [get], with missing rows as `None` instead of NOT_FOUND.
pub async fn get_optional<T: WardenResource>(
  name: &str,
) -> serror::Result<Option<Resource<T::Spec>>> {
  if name.is_empty() {
    return Err(
      anyhow!("Cannot find {} with empty name", T::kind())
        .status_code(StatusCode::BAD_REQUEST),
    );
  }
  let stored = T::coll()
    .find_one(doc! { "name": name })
    .await
    .context("failed to query db for resource")?;
  Ok(stored.map(Stored::into_inner))
}

// ======
// LIST
// ======

#[derive(Debug, Default)]
pub struct ListArgs {
  /// Restrict to children of this parent resource name.
  pub parent: String,
  pub page_size: i64,
  pub page_token: String,
  pub filter: String,
  pub include_deleted: bool,
}

/// Cursor paged list. The returned token is non empty iff the page
/// came back full.
#[instrument(
  level = "debug",
  skip_all,
  fields(resource_type = T::resource_type())
)]
pub async fn list<T: WardenResource>(
  args: ListArgs,
) -> serror::Result<(Vec<Resource<T::Spec>>, String)> {
  let cursor = resolve_cursor::<T>(&args)?;

  let mut filters = parse_filter::<T>(&cursor.filter)?;
  if !args.parent.is_empty() {
    filters.insert("parent", args.parent.as_str());
  }
  if !args.include_deleted {
    filters.insert("data.value.delete_time", 0_i64);
  }

  let options = FindOptions::builder()
    .sort(doc! { "name": 1 })
    .skip(cursor.page * cursor.page_size as u64)
    .limit(cursor.page_size)
    .build();

  let items = find_collect(T::coll(), filters, options)
    .await
    .with_context(|| {
      format!("failed to pull {}s from db", T::kind())
    })?;

  let next_page_token = if items.len() as i64 == cursor.page_size {
    PageCursor {
      page: cursor.page + 1,
      ..cursor
    }
    .encode()
  } else {
    String::new()
  };

  Ok((
    items.into_iter().map(Stored::into_inner).collect(),
    next_page_token,
  ))
}

/// First page: validate and clamp the requested size. Follow up
/// pages: the cursor is authoritative, so the filter (and size) a
/// caller opened the listing with stick for its whole run.
fn resolve_cursor<T: WardenResource>(
  args: &ListArgs,
) -> serror::Result<PageCursor> {
  if !args.page_token.is_empty() {
    return PageCursor::decode(&args.page_token)
      .map_err(|e| e.status_code(StatusCode::BAD_REQUEST));
  }
  let page_size = match args.page_size {
    0 => DEFAULT_PAGE_SIZE,
    size if size < 0 => {
      return Err(
        anyhow!("page_size must not be negative, got {size}")
          .status_code(StatusCode::BAD_REQUEST),
      );
    }
    size if size > T::MAX_PAGE_SIZE => {
      return Err(
        anyhow!(
          "page_size {size} exceeds the {} maximum of {}",
          T::kind(),
          T::MAX_PAGE_SIZE
        )
        .status_code(StatusCode::BAD_REQUEST),
      );
    }
    size => size,
  };
  Ok(PageCursor {
    page: 0,
    page_size,
    filter: args.filter.clone(),
  })
}

fn parse_filter<T: WardenResource>(
  filter: &str,
) -> serror::Result<Document> {
  let mut filters = Document::new();
  if filter.is_empty() {
    return Ok(filters);
  }
  let (field, value) = filter.split_once('=').ok_or_else(|| {
    anyhow!("invalid filter '{filter}': expected field=value")
      .status_code(StatusCode::BAD_REQUEST)
  })?;
  let path = match field.trim() {
    "name" => "name",
    "parent" => "parent",
    "display_name" => "data.value.display_name",
    field => {
      return Err(
        anyhow!(
          "invalid filter: cannot filter {} on '{field}'",
          T::kind()
        )
        .status_code(StatusCode::BAD_REQUEST),
      );
    }
  };
  filters.insert(path, value.trim());
  Ok(filters)
}

// =======
// CREATE
// =======

/// Persist a new resource, assigning uid / etag / timestamps.
/// Fails ALREADY_EXISTS when the name is taken by a live or soft
/// deleted row.
#[instrument(
  level = "debug",
  skip_all,
  fields(
    resource_type = T::resource_type(),
    resource_name = resource.name,
  )
)]
pub async fn create<T: WardenResource>(
  mut resource: Resource<T::Spec>,
) -> serror::Result<Resource<T::Spec>> {
  if resource.name.is_empty() {
    return Err(
      anyhow!("Must provide non-empty name for {}", T::kind())
        .status_code(StatusCode::BAD_REQUEST),
    );
  }

  // The unique index on name also guards this, the pre-check just
  // gives the better message.
  if get_optional::<T>(&resource.name).await?.is_some() {
    return Err(
      anyhow!(
        "{} with name '{}' already exists",
        T::kind(),
        resource.name
      )
      .status_code(StatusCode::CONFLICT),
    );
  }

  let now = warden_timestamp();
  if resource.uid.is_empty() {
    resource.uid = Uuid::new_v4().to_string();
  }
  resource.etag = new_etag();
  resource.create_time = now;
  resource.update_time = now;
  resource.delete_time = 0;

  T::coll()
    .insert_one(Stored::wrap(resource.clone()))
    .await
    .map_err(|e| {
      let msg = e.to_string();
      let error = anyhow::Error::from(e)
        .context(format!("failed to add {} to db", T::kind()));
      if msg.contains("E11000") {
        // Lost the race on the unique name index.
        error.status_code(StatusCode::CONFLICT)
      } else {
        error.into()
      }
    })?;

  Ok(resource)
}

// =======
// UPDATE
// =======

/// Atomic read-modify-write on one resource name.
///
/// The updater receives a clone of the stored resource. If the
/// message it returns carries a non empty etag differing from the
/// stored one, the caller acted on a stale version and the update
/// fails ABORTED. The replacement is written with a fresh etag via a
/// compare-and-swap on the observed etag, so concurrent updaters
/// lose cleanly instead of clobbering each other.
#[instrument(
  level = "debug",
  skip_all,
  fields(
    resource_type = T::resource_type(),
    resource_name = name,
  )
)]
pub async fn update<T, F>(
  name: &str,
  updater: F,
) -> serror::Result<Resource<T::Spec>>
where
  T: WardenResource,
  F: FnOnce(
    Resource<T::Spec>,
  ) -> serror::Result<Resource<T::Spec>>,
{
  let existing = get::<T>(name).await?;
  let observed_etag = existing.etag.clone();

  let mut updated = updater(existing.clone())?;

  if !updated.etag.is_empty() && updated.etag != observed_etag {
    return Err(
      anyhow!(
        "etag mismatch on {} {name}: the update was made against a stale version",
        T::kind()
      )
      .status_code(StatusCode::CONFLICT),
    );
  }

  // Server managed fields cannot be updated.
  updated.uid = existing.uid;
  updated.name = existing.name;
  updated.create_time = existing.create_time;
  updated.etag = new_etag();
  updated.update_time = warden_timestamp();

  let replaced = T::coll()
    .find_one_and_replace(
      doc! {
        "name": name,
        "data.value.etag": observed_etag.as_str(),
      },
      Stored::wrap(updated.clone()),
    )
    .await
    .context("failed to write resource update to db")?;

  if replaced.is_none() {
    return Err(
      anyhow!(
        "concurrent update on {} {name}: retry against the latest version",
        T::kind()
      )
      .status_code(StatusCode::CONFLICT),
    );
  }

  Ok(updated)
}

// =======
// DELETE
// =======

/// Soft delete: stamps `delete_time`, keeping the row (and its name)
/// until purge.
pub async fn delete<T: WardenResource>(
  name: &str,
  etag: &str,
) -> serror::Result<Resource<T::Spec>> {
  let etag = etag.to_string();
  update::<T, _>(name, move |mut resource| {
    if resource.is_deleted() {
      return Err(
        anyhow!("{} {} is already deleted", T::kind(), resource.name)
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    if !etag.is_empty() {
      resource.etag = etag;
    }
    resource.delete_time = warden_timestamp();
    Ok(resource)
  })
  .await
}

pub async fn undelete<T: WardenResource>(
  name: &str,
) -> serror::Result<Resource<T::Spec>> {
  update::<T, _>(name, |mut resource| {
    if !resource.is_deleted() {
      return Err(
        anyhow!("{} {} is not deleted", T::kind(), resource.name)
          .status_code(StatusCode::PRECONDITION_FAILED),
      );
    }
    resource.delete_time = 0;
    Ok(resource)
  })
  .await
}

/// Remove the row entirely, freeing the name for reuse.
#[instrument(
  level = "debug",
  skip_all,
  fields(
    resource_type = T::resource_type(),
    resource_name = name,
  )
)]
pub async fn purge<T: WardenResource>(
  name: &str,
) -> serror::Result<Resource<T::Spec>> {
  let existing = get::<T>(name).await?;
  T::coll()
    .delete_one(doc! { "name": name })
    .await
    .with_context(|| {
      format!("failed to purge {} {name} from db", T::kind())
    })?;
  Ok(existing)
}

#[cfg(test)]
mod tests {
  use warden_client::entities::{service::Service, user::User};

  use super::*;

  #[test]
  fn page_sizes_are_defaulted_and_capped() {
    let cursor =
      resolve_cursor::<Service>(&ListArgs::default()).unwrap();
    assert_eq!(cursor.page_size, DEFAULT_PAGE_SIZE);
    assert!(
      resolve_cursor::<Service>(&ListArgs {
        page_size: -1,
        ..Default::default()
      })
      .is_err()
    );
    assert!(
      resolve_cursor::<Service>(&ListArgs {
        page_size: 501,
        ..Default::default()
      })
      .is_err()
    );
    // user listings page deeper than the standard cap
    let users = resolve_cursor::<User>(&ListArgs {
      page_size: 1000,
      ..Default::default()
    })
    .unwrap();
    assert_eq!(users.page_size, 1000);
  }

  #[test]
  fn cursors_pin_the_filter_across_pages() {
    let first = resolve_cursor::<Service>(&ListArgs {
      filter: String::from(
        "parent=services/library.example.com",
      ),
      ..Default::default()
    })
    .unwrap();
    let token = PageCursor {
      page: first.page + 1,
      ..first.clone()
    }
    .encode();
    // A different filter on a follow up page cannot change the
    // result set the cursor was opened over.
    let next = resolve_cursor::<Service>(&ListArgs {
      page_token: token,
      filter: String::from("name=sneaky"),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(next.filter, first.filter);
    assert_eq!(next.page, 1);
  }

  #[test]
  fn filters_cover_known_fields_only() {
    assert!(parse_filter::<Service>("").unwrap().is_empty());
    let parent =
      parse_filter::<Service>("parent=services/x").unwrap();
    assert_eq!(parent.get_str("parent").unwrap(), "services/x");
    let display =
      parse_filter::<Service>("display_name=Library").unwrap();
    assert!(display.contains_key("data.value.display_name"));
    assert!(parse_filter::<Service>("spec.service_id=x").is_err());
    assert!(parse_filter::<Service>("garbage").is_err());
  }
}
