use crate::routes::functions::{required, FunctionRequest};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::response::{ApiResponse, ApiResult};
use actix_web::{post, web};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContentItem {
    pub table_name: Option<String>,
    pub item_id: Option<String>,
}

#[post("/deleteContentItem")]
pub async fn delete_content_item(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<DeleteContentItem>>,
) -> ApiResult<String> {
    let (actor, params) = body.into_inner().into_parts()?;
    let missing = "There is no tableName or itemId params!";
    let table = required(&params.table_name, missing)?;
    let item_id = required(&params.item_id, missing)?;

    let report = services
        .deleter
        .delete_content_item(&actor, table, item_id)
        .await
        .map_err(|err| {
            error!("Could not delete content item {table}/{item_id}: {err}");
            err
        })?;
    info!(
        "{} deleted {table}/{item_id} ({} media, {} failed)",
        actor.id,
        report.issued(),
        report.failure_count()
    );
    Ok(ApiResponse::Ok("Successfully deleted content item.".to_string()))
}

#[derive(Deserialize, Debug, Default)]
pub struct OnContentModify {
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

/// Pings the site's content hook and relays its JSON reply.
#[post("/onContentModify")]
pub async fn on_content_modify(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<OnContentModify>>,
) -> ApiResult<Value> {
    let (_actor, params) = body.into_inner().into_parts()?;
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return Ok(ApiResponse::Ok(Value::String(
            "Warning! There is no content hook!".to_string(),
        )));
    };

    let res = services.http.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(AppError::upstream(status.as_u16(), format!("content hook {url} failed")));
    }
    Ok(ApiResponse::Ok(res.json().await?))
}
