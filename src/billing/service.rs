use crate::billing::{BillingProvider, Customer, PaymentSource, Subscription, SubscriptionUpdate};
use crate::db::repository::Repository;
use crate::types::class;
use crate::types::error::AppError;
use crate::types::record::Pointer;
use crate::types::user::{Actor, User};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillingOverview {
    pub default_source: Option<String>,
    pub sources: Vec<PaymentSource>,
    /// `None` when there is none or it was canceled.
    pub subscription: Option<Subscription>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSource {
    pub default_source: Option<String>,
}

/// Payment-method and subscription management on behalf of the calling user.
pub struct BillingService {
    repo: Repository,
    billing: Option<Arc<dyn BillingProvider>>,
}

impl BillingService {
    pub fn new(repo: Repository, billing: Option<Arc<dyn BillingProvider>>) -> Self {
        Self { repo, billing }
    }

    fn provider(&self) -> Result<&dyn BillingProvider, AppError> {
        self.billing.as_deref().ok_or(AppError::BillingNotConfigured)
    }

    fn customer_id(user: &User, missing: &str) -> Result<String, AppError> {
        user.stripe_id
            .clone()
            .ok_or_else(|| AppError::Validation(missing.to_string()))
    }

    async fn live_customer(&self, customer_id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .provider()?
            .retrieve_customer(customer_id)
            .await?
            .filter(|c| !c.deleted))
    }

    async fn required_customer(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.live_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {customer_id}")))
    }

    async fn set_user_field(&self, user_id: &str, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        let mut record = self.repo.get(class::USER, user_id).await?;
        record.set(key, value);
        self.repo.save(&record).await.map(drop)
    }

    pub async fn overview(&self, actor: &Actor) -> Result<Option<BillingOverview>, AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;
        let Some(customer_id) = user.stripe_id else {
            return Ok(None);
        };
        // an unreachable customer reads as no customer
        let Ok(Some(customer)) = self.live_customer(&customer_id).await else {
            return Ok(None);
        };

        let sources = provider.list_sources(&customer_id).await?;
        let subscription = customer.first_subscription().filter(|s| !s.is_canceled()).cloned();
        Ok(Some(BillingOverview {
            default_source: customer.default_source,
            sources,
            subscription,
        }))
    }

    /// Attaches a payment source. Returns the new customer id when a
    /// customer had to be created for the user.
    pub async fn save_payment_source(
        &self,
        actor: &Actor,
        token_id: &str,
        as_default: bool,
    ) -> Result<Option<String>, AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;

        let existing = match user.stripe_id.as_deref() {
            Some(id) => self.live_customer(id).await.ok().flatten(),
            None => None,
        };
        if let Some(customer) = existing {
            let source = provider.create_source(&customer.id, token_id).await?;
            if as_default {
                provider.set_default_source(&customer.id, &source.id).await?;
            }
            return Ok(None);
        }

        let customer = provider.create_customer(user.email.as_deref(), token_id).await?;
        self.set_user_field(&user.id, "StripeId", customer.id.clone().into())
            .await?;
        info!("Created billing customer {} for user {}", customer.id, user.id);
        Ok(Some(customer.id))
    }

    pub async fn set_default_payment_source(&self, actor: &Actor, source_id: &str) -> Result<(), AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;
        let customer_id = Self::customer_id(&user, "There is no customer object yet!")?;
        provider.set_default_source(&customer_id, source_id).await.map(drop)
    }

    pub async fn remove_payment_source(&self, actor: &Actor, source_id: &str) -> Result<DefaultSource, AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;
        let customer_id = Self::customer_id(&user, "There is no customer object yet!")?;
        provider.delete_source(&customer_id, source_id).await?;
        let customer = self.required_customer(&customer_id).await?;
        Ok(DefaultSource {
            default_source: customer.default_source,
        })
    }

    /// Moves the user onto `plan_id`, swapping the existing subscription's
    /// plan or starting a new subscription.
    pub async fn pay_subscription(
        &self,
        actor: &Actor,
        plan_id: &str,
        yearly: bool,
    ) -> Result<Subscription, AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;
        let customer_id = Self::customer_id(&user, "There are no payment methods!")?;
        let plan = self.repo.get_pay_plan(plan_id).await?;
        let billing_plan = plan
            .billing_plan_id(yearly)
            .ok_or_else(|| AppError::Validation("Wrong pay plan!".into()))?
            .to_string();

        let customer = self.required_customer(&customer_id).await?;
        let current = customer
            .first_subscription()
            .map(|s| (s.id.clone(), s.items.data.first().map(|i| i.id.clone())));
        let subscription = match current {
            Some((subscription_id, item)) => {
                let item = item.ok_or_else(|| {
                    AppError::Internal(format!("subscription {subscription_id} has no items"))
                })?;
                let update = SubscriptionUpdate {
                    item_plan: Some((item, billing_plan)),
                    cancel_at_period_end: Some(false),
                };
                provider.update_subscription(&subscription_id, &update).await?
            }
            None => provider.create_subscription(&customer_id, &billing_plan).await?,
        };

        self.set_user_field(&user.id, "payPlan", Pointer::new(class::PAY_PLAN, &plan.id).into())
            .await?;
        info!("User {} subscribed to plan {}", user.id, plan.id);
        Ok(subscription)
    }

    pub async fn cancel_subscription(&self, actor: &Actor) -> Result<Subscription, AppError> {
        let provider = self.provider()?;
        let user = self.repo.get_user(&actor.id).await?;
        let customer_id = Self::customer_id(&user, "There are no Stripe customer!")?;
        let customer = self.required_customer(&customer_id).await?;
        let subscription = customer
            .first_subscription()
            .ok_or_else(|| AppError::NotFound("There are no subscription!".into()))?;
        let update = SubscriptionUpdate {
            item_plan: None,
            cancel_at_period_end: Some(true),
        };
        provider.update_subscription(&subscription.id, &update).await
    }
}
