use resolver_api::Resolve;
use warden_client::{
  api::read::{
    GetService, GetVersion, GetVersionResponse, ListServices,
    ListServicesResponse,
  },
  entities::service::Service,
};

use crate::{
  api::iam_url,
  auth::authorize,
  resource::{self, ListArgs},
};

use super::ReadArgs;

impl Resolve<ReadArgs> for GetVersion {
  async fn resolve(
    self,
    _: &ReadArgs,
  ) -> serror::Result<GetVersionResponse> {
    Ok(GetVersionResponse {
      version: format!("v{}", env!("CARGO_PKG_VERSION")),
    })
  }
}

impl Resolve<ReadArgs> for GetService {
  #[instrument(name = "GetService", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<Service> {
    authorize(
      &args.subject,
      "iam/services.get",
      &iam_url(&self.name),
    )
    .await?;
    resource::get::<Service>(&self.name).await
  }
}

impl Resolve<ReadArgs> for ListServices {
  #[instrument(name = "ListServices", skip(args))]
  async fn resolve(
    self,
    args: &ReadArgs,
  ) -> serror::Result<ListServicesResponse> {
    authorize(
      &args.subject,
      "iam/services.list",
      "iam/root/iam/Service",
    )
    .await?;
    let (services, next_page_token) =
      resource::list::<Service>(ListArgs {
        parent: String::new(),
        page_size: self.page_size,
        page_token: self.page_token,
        filter: self.filter,
        include_deleted: self.show_deleted,
      })
      .await?;
    Ok(ListServicesResponse {
      services,
      next_page_token,
    })
  }
}
