use crate::routes::functions::{required, FunctionRequest};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::mail::InviteEmail;
use crate::types::response::{ApiResponse, ApiResult};
use crate::utils::mail::mail_invite;
use actix_web::{post, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InviteUser {
    pub email: Option<String>,
    pub site_name: Option<String>,
}

pub fn invite_link(site_url: &str, email: &str) -> String {
    format!(
        "{}/sign?mode=register&email={}",
        site_url.trim_end_matches('/'),
        urlencoding::encode(email)
    )
}

#[post("/inviteUser")]
pub async fn invite_user(
    services: web::Data<Arc<Services>>,
    body: web::Json<FunctionRequest<InviteUser>>,
) -> ApiResult<String> {
    let (actor, params) = body.into_inner().into_parts()?;
    let missing = "Email or siteName is empty!";
    let email = required(&params.email, missing)?;
    let site_name = required(&params.site_name, missing)?;

    let mailer = services
        .mailer
        .as_deref()
        .ok_or_else(|| AppError::Internal("no mail adapter configured".into()))?;
    let invite = InviteEmail {
        recipient: email.to_string(),
        site_name: site_name.to_string(),
        email_self: actor.email.clone().unwrap_or_default(),
        link: invite_link(&services.settings.site_url, email),
    };

    if let Err(err) = mail_invite(mailer, &services.settings.mail_from, invite).await {
        error!("Got an error in inviteUser: {err}");
        return Err(err);
    }
    Ok(ApiResponse::Ok("Invite email sent!".to_string()))
}
