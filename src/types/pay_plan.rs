use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PayPlan {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "priceMonthly", default)]
    pub price_monthly: f64,
    #[serde(rename = "priceYearly", default)]
    pub price_yearly: f64,
    /// Zero or absent means unlimited.
    #[serde(rename = "limitSites", default)]
    pub limit_sites: Option<u64>,
    /// Billing product id.
    #[serde(rename = "StripeId", default)]
    pub stripe_id: Option<String>,
    #[serde(rename = "StripeIdMonthly", default)]
    pub stripe_id_monthly: Option<String>,
    #[serde(rename = "StripeIdYearly", default)]
    pub stripe_id_yearly: Option<String>,
}

impl PayPlan {
    pub fn site_limit(&self) -> Option<u64> {
        self.limit_sites.filter(|limit| *limit > 0)
    }

    pub fn billing_plan_id(&self, yearly: bool) -> Option<&str> {
        if yearly {
            self.stripe_id_yearly.as_deref()
        } else {
            self.stripe_id_monthly.as_deref()
        }
    }
}
