use crate::billing::{
    BillingProvider, Customer, List, PaymentSource, Subscription, SubscriptionUpdate,
};
use crate::types::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API: &str = "https://api.stripe.com/v1";

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Deserialize)]
struct StripeError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe REST client, form-encoded requests with the secret key as basic
/// auth user.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Result<Self, AppError> {
        Self::with_base_url(secret_key, API)
    }

    pub fn with_base_url(secret_key: impl Into<String>, base_url: &str) -> Result<Self, AppError> {
        let client = ClientBuilder::new()
            .user_agent("chisel-guard/0.1 (+reqwest)")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn enc(id: &str) -> String {
        urlencoding::encode(id).into_owned()
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, AppError> {
        let res = req.basic_auth(&self.secret_key, None::<&str>).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json().await?);
        }
        let body = res.text().await.unwrap_or_default();
        let parsed: Option<StripeErrorBody> = serde_json::from_str(&body).ok();
        Err(AppError::Upstream {
            status: status.as_u16(),
            code: parsed.as_ref().and_then(|p| p.error.code.clone()),
            message: parsed.and_then(|p| p.error.message).unwrap_or(body),
        })
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>, AppError> {
        let req = self
            .client
            .get(self.url(&format!("customers/{}", Self::enc(customer_id))))
            .query(&[("expand[]", "subscriptions")]);
        match self.send(req).await {
            Ok(customer) => Ok(Some(customer)),
            Err(AppError::Upstream { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_customer(&self, email: Option<&str>, source_token: &str) -> Result<Customer, AppError> {
        let mut form = vec![("source", source_token)];
        if let Some(email) = email {
            form.push(("email", email));
        }
        self.send(self.client.post(self.url("customers")).form(&form))
            .await
    }

    async fn set_default_source(&self, customer_id: &str, source_id: &str) -> Result<Customer, AppError> {
        let req = self
            .client
            .post(self.url(&format!("customers/{}", Self::enc(customer_id))))
            .form(&[("default_source", source_id)]);
        self.send(req).await
    }

    async fn list_sources(&self, customer_id: &str) -> Result<Vec<PaymentSource>, AppError> {
        let mut sources = vec![];
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![("limit".to_string(), "100".to_string())];
            if let Some(after) = &after {
                query.push(("starting_after".to_string(), after.clone()));
            }
            let req = self
                .client
                .get(self.url(&format!("customers/{}/sources", Self::enc(customer_id))))
                .query(&query);
            let page: List<PaymentSource> = self.send(req).await?;
            after = page.data.last().map(|s| s.id.clone());
            sources.extend(page.data);
            if !page.has_more || after.is_none() {
                debug!("Listed {} sources of {customer_id}", sources.len());
                return Ok(sources);
            }
        }
    }

    async fn create_source(&self, customer_id: &str, source_token: &str) -> Result<PaymentSource, AppError> {
        let req = self
            .client
            .post(self.url(&format!("customers/{}/sources", Self::enc(customer_id))))
            .form(&[("source", source_token)]);
        self.send(req).await
    }

    async fn delete_source(&self, customer_id: &str, source_id: &str) -> Result<(), AppError> {
        let req = self.client.delete(self.url(&format!(
            "customers/{}/sources/{}",
            Self::enc(customer_id),
            Self::enc(source_id)
        )));
        self.send::<serde_json::Value>(req).await.map(drop)
    }

    async fn create_subscription(&self, customer_id: &str, plan_id: &str) -> Result<Subscription, AppError> {
        let req = self.client.post(self.url("subscriptions")).form(&[
            ("customer", customer_id),
            ("items[0][plan]", plan_id),
        ]);
        self.send(req).await
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription, AppError> {
        let mut form: Vec<(&str, String)> = vec![];
        if let Some((item, plan)) = &update.item_plan {
            form.push(("items[0][id]", item.clone()));
            form.push(("items[0][plan]", plan.clone()));
        }
        if let Some(cancel) = update.cancel_at_period_end {
            form.push(("cancel_at_period_end", cancel.to_string()));
        }
        let req = self
            .client
            .post(self.url(&format!("subscriptions/{}", Self::enc(subscription_id))))
            .form(&form);
        self.send(req).await
    }
}
