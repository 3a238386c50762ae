use resolver_api::Resolve;
use warden_client::{
  api::read::{GetRole, ListRoles, ListRolesResponse},
  entities::role::Role,
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, ListArgs},
};

use super::ReadArgs;

impl Resolve<ReadArgs> for GetRole {
  #[instrument(name = "GetRole", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<Role> {
    authorize(&args.subject, "iam/roles.get", &iam_url(&self.name))
      .await?;
    resource::get::<Role>(&self.name).await
  }
}

impl Resolve<ReadArgs> for ListRoles {
  #[instrument(name = "ListRoles", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<ListRolesResponse> {
    authorize(&args.subject, "iam/roles.list", "iam/root/iam/Role")
      .await?;
    let (roles, next_page_token) =
      resource::list::<Role>(ListArgs {
        parent: self.parent,
        page_size: self.page_size,
        page_token: self.page_token,
        filter: self.filter,
        include_deleted: self.show_deleted,
      })
      .await?;
    Ok(ListRolesResponse {
      roles,
      next_page_token,
    })
  }
}
