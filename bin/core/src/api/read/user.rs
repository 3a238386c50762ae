use resolver_api::Resolve;
use warden_client::{
  api::read::{GetUser, ListUsers, ListUsersResponse},
  entities::user::User,
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, ListArgs},
};

use super::ReadArgs;

impl Resolve<ReadArgs> for GetUser {
  #[instrument(name = "GetUser", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<User> {
    authorize(&args.subject, "iam/users.get", &iam_url(&self.name))
      .await?;
    resource::get::<User>(&self.name).await
  }
}

impl Resolve<ReadArgs> for ListUsers {
  #[instrument(name = "ListUsers", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<ListUsersResponse> {
    authorize(&args.subject, "iam/users.list", "iam/root/iam/User")
      .await?;
    let (users, next_page_token) =
      resource::list::<User>(ListArgs {
        parent: String::new(),
        page_size: self.page_size,
        page_token: self.page_token,
        filter: self.filter,
        include_deleted: self.show_deleted,
      })
      .await?;
    Ok(ListUsersResponse {
      users,
      next_page_token,
    })
  }
}
