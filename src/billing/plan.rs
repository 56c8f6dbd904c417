use crate::billing::{BillingProvider, Customer};
use crate::db::repository::Repository;
use crate::types::class;
use crate::types::error::AppError;
use crate::types::pay_plan::PayPlan;
use crate::types::record::Pointer;
use crate::types::user::User;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Works out which plan a user is on, asking the billing provider when one
/// is configured.
pub struct PlanResolver {
    repo: Repository,
    billing: Option<Arc<dyn BillingProvider>>,
    default_plan: RwLock<Option<PayPlan>>,
}

impl PlanResolver {
    pub fn new(repo: Repository, billing: Option<Arc<dyn BillingProvider>>) -> Self {
        Self {
            repo,
            billing,
            default_plan: RwLock::new(None),
        }
    }

    /// The zero-price plan. Cached once found.
    pub async fn default_plan(&self) -> Result<Option<PayPlan>, AppError> {
        if let Some(plan) = self.default_plan.read().await.as_ref() {
            return Ok(Some(plan.clone()));
        }
        let plan = self.repo.free_pay_plan().await?;
        if let Some(plan) = &plan {
            *self.default_plan.write().await = Some(plan.clone());
        }
        Ok(plan)
    }

    async fn assigned_plan(&self, user: &User) -> Result<Option<PayPlan>, AppError> {
        let Some(pointer) = &user.pay_plan else {
            return Ok(None);
        };
        match self.repo.get_pay_plan(&pointer.object_id).await {
            Ok(plan) => Ok(Some(plan)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn subscribed_plan(&self, customer: &Customer) -> Result<Option<PayPlan>, AppError> {
        let product = customer
            .first_subscription()
            .filter(|s| !s.is_canceled())
            .and_then(|s| s.plan.as_ref())
            .and_then(|p| p.product.as_deref());
        match product {
            Some(product) => self.repo.pay_plan_for_product(product).await,
            None => Ok(None),
        }
    }

    /// Resolves the user's current plan. Provider errors are not surfaced;
    /// the user falls back to the default plan.
    pub async fn get_pay_plan(&self, user: &User) -> Result<Option<PayPlan>, AppError> {
        let Some(billing) = &self.billing else {
            return self.assigned_plan(user).await;
        };
        let Some(customer_id) = user.stripe_id.as_deref() else {
            return self.default_plan().await;
        };

        let customer = match billing.retrieve_customer(customer_id).await {
            Ok(Some(customer)) if !customer.deleted => customer,
            Ok(_) => {
                debug!("Customer {customer_id} of user {} is gone", user.id);
                return self.default_plan().await;
            }
            Err(err) => {
                warn!("Resolving customer {customer_id} failed, using default plan: {err}");
                return self.default_plan().await;
            }
        };

        match self.subscribed_plan(&customer).await? {
            Some(plan) => Ok(Some(plan)),
            None => self.default_plan().await,
        }
    }

    /// Rejects a new site when the user's plan caps sites and the cap is
    /// reached.
    pub async fn check_site_quota(&self, user_id: &str) -> Result<(), AppError> {
        let user = self.repo.get_user(user_id).await?;
        let Some(limit) = self.get_pay_plan(&user).await?.and_then(|p| p.site_limit()) else {
            return Ok(());
        };
        let owned = self
            .repo
            .count_sites_owned_by(&Pointer::new(class::USER, user_id))
            .await?;
        if owned >= limit {
            debug!("User {user_id} owns {owned} of {limit} sites");
            return Err(AppError::QuotaExceeded);
        }
        Ok(())
    }
}
