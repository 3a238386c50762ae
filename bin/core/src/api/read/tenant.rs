use resolver_api::Resolve;
use warden_client::{
  api::read::{
    GetOrganization, GetProject, ListOrganizations,
    ListOrganizationsResponse, ListProjects, ListProjectsResponse,
  },
  entities::tenant::{Organization, Project},
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, ListArgs},
};

use super::ReadArgs;

impl Resolve<ReadArgs> for GetOrganization {
  #[instrument(name = "GetOrganization", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<Organization> {
    authorize(
      &args.subject,
      "iam/organizations.get",
      &iam_url(&self.name),
    )
    .await?;
    resource::get::<Organization>(&self.name).await
  }
}

impl Resolve<ReadArgs> for ListOrganizations {
  #[instrument(name = "ListOrganizations", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<ListOrganizationsResponse> {
    authorize(
      &args.subject,
      "iam/organizations.list",
      "iam/root/iam/Organization",
    )
    .await?;
    let (organizations, next_page_token) =
      resource::list::<Organization>(ListArgs {
        parent: String::new(),
        page_size: self.page_size,
        page_token: self.page_token,
        filter: self.filter,
        include_deleted: self.show_deleted,
      })
      .await?;
    Ok(ListOrganizationsResponse {
      organizations,
      next_page_token,
    })
  }
}

impl Resolve<ReadArgs> for GetProject {
  #[instrument(name = "GetProject", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<Project> {
    authorize(
      &args.subject,
      "iam/projects.get",
      &iam_url(&self.name),
    )
    .await?;
    resource::get::<Project>(&self.name).await
  }
}

impl Resolve<ReadArgs> for ListProjects {
  #[instrument(name = "ListProjects", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<ListProjectsResponse> {
    authorize(
      &args.subject,
      "iam/projects.list",
      "iam/root/iam/Project",
    )
    .await?;
    let (projects, next_page_token) =
      resource::list::<Project>(ListArgs {
        parent: self.parent,
        page_size: self.page_size,
        page_token: self.page_token,
        filter: self.filter,
        include_deleted: self.show_deleted,
      })
      .await?;
    Ok(ListProjectsResponse {
      projects,
      next_page_token,
    })
  }
}
