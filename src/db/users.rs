use crate::db::repository::Repository;
use crate::db::Query;
use crate::types::class;
use crate::types::error::AppError;
use crate::types::pay_plan::PayPlan;
use crate::types::user::User;

impl Repository {
    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        self.get(class::USER, id).await?.decode()
    }

    pub async fn get_pay_plan(&self, id: &str) -> Result<PayPlan, AppError> {
        self.get(class::PAY_PLAN, id).await?.decode()
    }

    /// The free plan, if one is defined.
    pub async fn free_pay_plan(&self) -> Result<Option<PayPlan>, AppError> {
        self.first(Query::new(class::PAY_PLAN).equal_to("priceMonthly", 0))
            .await?
            .map(|r| r.decode())
            .transpose()
    }

    pub async fn pay_plan_for_product(&self, product_id: &str) -> Result<Option<PayPlan>, AppError> {
        self.first(Query::new(class::PAY_PLAN).equal_to("StripeId", product_id))
            .await?
            .map(|r| r.decode())
            .transpose()
    }
}
