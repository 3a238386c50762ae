use resolver_api::Resolve;
use warden_client::{
  api::read::GetIamPolicy,
  entities::policy::{Policy, empty_policy},
};

use crate::{auth::authorize, resource, state};

use super::ReadArgs;

impl Resolve<ReadArgs> for GetIamPolicy {
  #[instrument(name = "GetIamPolicy", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<Policy> {
    // Resolving validates the url names a declared resource.
    let target =
      state::schema_registry().resolve(&self.resource).await?;
    authorize(&args.subject, "iam/policies.get", &self.resource)
      .await?;
    let policy = resource::policy_for(&target.self_link).await?;
    Ok(
      policy.unwrap_or_else(|| empty_policy(target.self_link)),
    )
  }
}
