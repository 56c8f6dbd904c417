use crate::hooks::{dispatch, HookOutcome, HookRequest, Trigger};
use crate::service::Services;
use crate::types::response::{ApiResponse, ApiResult};
use actix_web::{post, web};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

#[post("/{class_name}/{trigger}")]
pub async fn trigger(
    _req: actix_web::HttpRequest,
    services: web::Data<Arc<Services>>,
    path: web::Path<(String, String)>,
    body: web::Json<HookRequest>,
) -> ApiResult<Value> {
    let (class_name, trigger) = path.into_inner();
    let trigger: Trigger = trigger.parse()?;
    info!("{trigger} {class_name}");

    match dispatch(&services, &class_name, trigger, body.into_inner()).await {
        Ok(HookOutcome::Save(record)) => Ok(ApiResponse::Ok(record.into())),
        Ok(HookOutcome::Proceed) => Ok(ApiResponse::EmptyOk),
        Err(err) => {
            error!("{trigger} {class_name} rejected: {err}");
            Err(err)
        }
    }
}
