use crate::routes::functions::{required, FunctionRequest};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::response::{ApiResponse, ApiResult};
use actix_web::{post, web};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Deserialize, Debug, Default)]
pub struct CheckPassword {
    pub password: Option<String>,
}

/// Re-authenticates the caller; a wrong password fails with the store's
/// login error.
#[post("/checkPassword")]
pub async fn check_password(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<CheckPassword>>,
) -> ApiResult<Value> {
    let (actor, params) = body.into_inner().into_parts()?;
    let password = required(&params.password, "There is no password param!")?;
    let username = match actor.username.clone() {
        Some(username) => username,
        None => services
            .repo
            .get_user(&actor.id)
            .await?
            .username
            .ok_or_else(|| AppError::Validation("user has no username".into()))?,
    };

    let user = services.repo.store().log_in(&username, password).await?;
    Ok(ApiResponse::Ok(user.into()))
}
