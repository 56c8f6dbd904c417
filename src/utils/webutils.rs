use crate::service::Services;
use actix_web::{dev::Payload, dev::ServiceRequest, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::types::error::AppError;

/// Header the backend sets on every trigger and function call.
pub const WEBHOOK_KEY_HEADER: &str = "X-Parse-Webhook-Key";

/// The webhook key presented by the caller.
#[derive(Debug, Clone)]
pub struct WebhookKey(String);

impl WebhookKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for WebhookKey {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.headers()
                .get(WEBHOOK_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|key| WebhookKey(key.to_string()))
                .ok_or(AppError::Unauthorized),
        )
    }
}

/// Only the backend holding the webhook key may call in.
pub async fn validate_webhook_key(
    req: ServiceRequest,
    key: WebhookKey,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let accepted = req
        .app_data::<web::Data<Arc<Services>>>()
        .is_some_and(|services| key.as_str() == services.settings.webhook_key);
    if accepted {
        Ok(req)
    } else {
        Err((AppError::Unauthorized.into(), req))
    }
}
