use resolver_api::Resolve;
use warden_client::{
  api::write::{SetIamPolicy, SetIamPolicyResponse},
  entities::{
    operation::Operation,
    policy::{Policy, PolicySpec},
    role::Role,
  },
};

use crate::{
  api::iam_url,
  auth::authorize,
  check,
  config::core_config,
  reconcile::policy::{ResolvedBinding, project_policy},
  resource, state, validate,
};

use super::WriteArgs;

/// Validate the binding set and canonicalize its members. Roles
/// resolve either by plain existence, or through a `iam/roles.use`
/// check for the caller when the deployment demands it.
async fn resolve_bindings(
  args: &WriteArgs,
  spec: &PolicySpec,
) -> serror::Result<Vec<ResolvedBinding>> {
  let mut violations = validate::Violations::new();
  let mut resolved = Vec::with_capacity(spec.bindings.len());

  for (i, binding) in spec.bindings.iter().enumerate() {
    let role_field = format!("spec.bindings[{i}].role");
    let role = resource::get_optional::<Role>(&binding.role)
      .await?
      .filter(|role| !role.is_deleted());
    match role {
      None => violations.push(
        role_field,
        format!("unknown role '{}'", binding.role),
      ),
      Some(role)
        if core_config().require_role_use_permission =>
      {
        let outcome = check::engine()
          .check_access(
            &args.subject,
            "iam/roles.use",
            &iam_url(&role.name),
            &[],
            "SetIamPolicy",
          )
          .await?;
        if !outcome.allowed {
          violations.push(
            role_field,
            format!(
              "caller may not use role '{}'",
              binding.role
            ),
          );
        }
      }
      Some(_) => {}
    }

    let principals = validate::resolve_members(
      state::subject_resolver(),
      &mut violations,
      &format!("spec.bindings[{i}].members"),
      &binding.members,
    )
    .await;
    resolved.push(ResolvedBinding {
      role: binding.role.clone(),
      principals,
    });
  }

  violations.into_result()?;
  Ok(resolved)
}

impl Resolve<WriteArgs> for SetIamPolicy {
  #[instrument(name = "SetIamPolicy", skip(args))]
  async fn resolve(
    self,
    args: &WriteArgs,
  ) -> serror::Result<SetIamPolicyResponse> {
    let SetIamPolicy {
      resource,
      policy,
      validate_only,
    } = self;

    let target =
      state::schema_registry().resolve(&resource).await?;
    authorize(&args.subject, "iam/policies.set", &resource)
      .await?;

    let bindings = resolve_bindings(args, &policy.spec).await?;

    let mut replacement = policy;
    replacement.name = target.self_link.clone();

    if validate_only {
      return Ok(Operation::completed(replacement));
    }

    // The policy row is the authoritative binding set for the
    // resource: create it on first set, replace it afterwards.
    let stored = match resource::get_optional::<Policy>(
      &target.self_link,
    )
    .await?
    {
      Some(_) => {
        resource::update::<Policy, _>(
          &target.self_link,
          move |mut existing| {
            existing.etag = replacement.etag.clone();
            existing.display_name =
              replacement.display_name.clone();
            existing.description =
              replacement.description.clone();
            existing.spec = replacement.spec.clone();
            Ok(existing)
          },
        )
        .await?
      }
      None => resource::create::<Policy>(replacement).await?,
    };

    project_policy(state::relationship_store(), &target, &bindings)
      .await?;

    Ok(Operation::completed(stored))
  }
}
