use crate::types::error::AppError;
use actix_web::{HttpResponse, Responder};
use serde::Serialize;

/// Webhook replies. The backend reads the `success` key of the body.
pub enum ApiResponse<T> {
    Ok(T),
    EmptyOk,
}

#[derive(Serialize)]
struct SuccessBody<T> {
    success: T,
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = actix_web::body::BoxBody;
    fn respond_to(self, _: &actix_web::HttpRequest) -> HttpResponse {
        match self {
            ApiResponse::Ok(v) => HttpResponse::Ok().json(SuccessBody { success: v }),
            ApiResponse::EmptyOk => HttpResponse::Ok().json(SuccessBody { success: true }),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;
