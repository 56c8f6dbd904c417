use crate::billing::service::{BillingOverview, DefaultSource};
use crate::billing::Subscription;
use crate::routes::functions::{required, FunctionRequest};
use crate::service::Services;
use crate::types::response::{ApiResponse, ApiResult};
use actix_web::{post, web};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Deserialize, Debug, Default)]
pub struct NoParams {}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavePaymentSource {
    pub token_id: Option<String>,
    #[serde(default)]
    pub as_default: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSourceParams {
    pub source_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaySubscription {
    pub plan_id: Option<String>,
    #[serde(default)]
    pub is_yearly: bool,
}

#[post("/getStripeData")]
pub async fn get_stripe_data(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<NoParams>>,
) -> ApiResult<Option<BillingOverview>> {
    let (actor, _) = body.into_inner().into_parts()?;
    Ok(ApiResponse::Ok(services.billing.overview(&actor).await?))
}

#[post("/savePaymentSource")]
pub async fn save_payment_source(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<SavePaymentSource>>,
) -> ApiResult<Option<String>> {
    let (actor, params) = body.into_inner().into_parts()?;
    let token = required(&params.token_id, "There is no token param!")?;
    let created = services
        .billing
        .save_payment_source(&actor, token, params.as_default)
        .await?;
    Ok(ApiResponse::Ok(created))
}

#[post("/setDefaultPaymentSource")]
pub async fn set_default_payment_source(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<PaymentSourceParams>>,
) -> ApiResult<Value> {
    let (actor, params) = body.into_inner().into_parts()?;
    let source = required(&params.source_id, "There is no source param!")?;
    services
        .billing
        .set_default_payment_source(&actor, source)
        .await?;
    Ok(ApiResponse::Ok(Value::Null))
}

#[post("/removePaymentSource")]
pub async fn remove_payment_source(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<PaymentSourceParams>>,
) -> ApiResult<DefaultSource> {
    let (actor, params) = body.into_inner().into_parts()?;
    let source = required(&params.source_id, "There is no sourceId param!")?;
    Ok(ApiResponse::Ok(
        services.billing.remove_payment_source(&actor, source).await?,
    ))
}

#[post("/paySubscription")]
pub async fn pay_subscription(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<PaySubscription>>,
) -> ApiResult<Subscription> {
    let (actor, params) = body.into_inner().into_parts()?;
    let plan_id = required(&params.plan_id, "There is no plan param!")?;
    Ok(ApiResponse::Ok(
        services
            .billing
            .pay_subscription(&actor, plan_id, params.is_yearly)
            .await?,
    ))
}

#[post("/cancelSubscription")]
pub async fn cancel_subscription(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<NoParams>>,
) -> ApiResult<Subscription> {
    let (actor, _) = body.into_inner().into_parts()?;
    Ok(ApiResponse::Ok(services.billing.cancel_subscription(&actor).await?))
}
