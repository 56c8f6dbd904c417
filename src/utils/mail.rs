use crate::types::error::AppError;
use crate::types::mail::{InviteEmail, SendEmail};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const RESEND_API: &str = "https://api.resend.com/emails";

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email and returns the provider's response body.
    async fn send(&self, email: SendEmail) -> Result<String, AppError>;
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
    api: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let client = ClientBuilder::new()
            .user_agent("chisel-guard/0.1 (+reqwest)")
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api: RESEND_API.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: SendEmail) -> Result<String, AppError> {
        debug!("[mail] -> POST {} to {:?}", self.api, email.to);

        let t0 = Instant::now();
        let res = self
            .client
            .post(&self.api)
            .bearer_auth(&self.api_key) // do NOT log the key
            .json(&email)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        debug!("[mail] <- status: {status} in {} ms", t0.elapsed().as_millis());

        if status.is_success() {
            Ok(body)
        } else {
            Err(AppError::Upstream {
                status: status.as_u16(),
                code: None,
                message: format!("Resend API error: {body}"),
            })
        }
    }
}

pub async fn mail_invite(mailer: &dyn Mailer, from: &str, invite: InviteEmail) -> Result<(), AppError> {
    let recipient = invite.recipient.clone();
    info!("Send invite to {recipient}");
    mailer.send(invite.into_send_email(from)).await?;
    info!("Invite sent to {recipient}");
    Ok(())
}
