//! Payment plans and the optional billing provider.

use crate::types::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod plan;
pub mod service;
pub mod stripe;

pub const STATUS_CANCELED: &str = "canceled";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self {
            data: vec![],
            has_more: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BillingPlan {
    pub id: String,
    #[serde(default)]
    pub product: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubscriptionItem {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub plan: Option<BillingPlan>,
    #[serde(default)]
    pub items: List<SubscriptionItem>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Everything else the provider returns, passed through to callers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subscription {
    pub fn is_canceled(&self) -> bool {
        self.status == STATUS_CANCELED
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub default_source: Option<String>,
    #[serde(default)]
    pub subscriptions: List<Subscription>,
}

impl Customer {
    pub fn first_subscription(&self) -> Option<&Subscription> {
        self.subscriptions.data.first()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentSource {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SubscriptionUpdate {
    /// `(subscription item id, billing plan id)` to swap.
    pub item_plan: Option<(String, String)>,
    pub cancel_at_period_end: Option<bool>,
}

/// External billing provider, addressed by its own customer and
/// subscription ids.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// `Ok(None)` when the provider does not know the customer.
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>, AppError>;
    async fn create_customer(&self, email: Option<&str>, source_token: &str) -> Result<Customer, AppError>;
    async fn set_default_source(&self, customer_id: &str, source_id: &str) -> Result<Customer, AppError>;
    async fn list_sources(&self, customer_id: &str) -> Result<Vec<PaymentSource>, AppError>;
    async fn create_source(&self, customer_id: &str, source_token: &str) -> Result<PaymentSource, AppError>;
    async fn delete_source(&self, customer_id: &str, source_id: &str) -> Result<(), AppError>;
    async fn create_subscription(&self, customer_id: &str, plan_id: &str) -> Result<Subscription, AppError>;
    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription, AppError>;
}
