//! Cloud functions: `POST /functions/{name}` with the caller and params.

use crate::types::error::AppError;
use crate::types::user::Actor;
use serde::Deserialize;

pub mod account;
pub mod billing;
pub mod content;
pub mod invite;

/// Function payload as the backend posts it.
#[derive(Deserialize, Debug, Clone)]
pub struct FunctionRequest<P> {
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub user: Option<Actor>,
    pub params: Option<P>,
}

impl<P: Default> FunctionRequest<P> {
    /// Every function needs a signed-in caller, master or not.
    pub fn into_parts(self) -> Result<(Actor, P), AppError> {
        let actor = self.user.ok_or(AppError::AuthRequired)?;
        Ok((actor, self.params.unwrap_or_default()))
    }
}

pub(crate) fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}
