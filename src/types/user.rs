use crate::types::record::Pointer;
use serde::{Deserialize, Serialize};

/// The authenticated caller forwarded by the backend with each request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            email: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "StripeId", default)]
    pub stripe_id: Option<String>,
    #[serde(rename = "payPlan", default)]
    pub pay_plan: Option<Pointer>,
}
