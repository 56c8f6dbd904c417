use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Code the frontend keys on when billing is switched off.
pub const BILLING_NOT_CONFIGURED_CODE: u16 = 701;

#[derive(Debug, Error)]
pub enum AppError {
    // caller-facing
    #[error("access denied")]
    AccessDenied,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("the user has exhausted their sites' limit")]
    QuotaExceeded,
    #[error("must be signed in to call this function")]
    AuthRequired,
    #[error("unauthorized")]
    Unauthorized,
    #[error("billing provider is not initialized")]
    BillingNotConfigured,

    // collaborators
    #[error("upstream responded with {status}: {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl AppError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        AppError::Upstream {
            status,
            code: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BillingNotConfigured => "BILLING_NOT_CONFIGURED",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Serde(_) => "SERDE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the object store reported the record as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Upstream { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            Self::AuthRequired | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BillingNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Serde(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            Self::BillingNotConfigured => BILLING_NOT_CONFIGURED_CODE.to_string(),
            Self::Upstream {
                code: Some(code), ..
            } => code.clone(),
            _ => self.kind().to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            code: &code,
        })
    }
}
