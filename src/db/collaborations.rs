use crate::db::repository::Repository;
use crate::db::Query;
use crate::types::class;
use crate::types::error::AppError;
use crate::types::record::{Pointer, Record};

impl Repository {
    pub async fn site_collaborations(&self, site: &Pointer) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(class::COLLABORATION).equal_to("site", site))
            .await
    }

    /// Collaborations of the site that belong to someone other than `user`,
    /// pending invites included.
    pub async fn site_collaborations_except(
        &self,
        site: &Pointer,
        user: &Pointer,
    ) -> Result<Vec<Record>, AppError> {
        self.all(
            Query::new(class::COLLABORATION)
                .equal_to("site", site)
                .not_equal_to("user", user),
        )
        .await
    }

    pub async fn pending_collaborations_for_email(&self, email: &str) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(class::COLLABORATION).equal_to("email", email))
            .await
    }

    pub async fn site_media_items(&self, site: &Pointer) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(class::MEDIA_ITEM).equal_to("site", site))
            .await
    }

    pub async fn site_models(&self, site: &Pointer) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(class::MODEL).equal_to("site", site)).await
    }

    pub async fn count_sites_owned_by(&self, user: &Pointer) -> Result<u64, AppError> {
        self.count(Query::new(class::SITE).equal_to("owner", user))
            .await
    }
}
