use crate::db::parse_service::ParseConnection;
use std::env;
use std::sync::OnceLock;

#[derive(Clone, Debug)]
pub struct EnvConfig {
    pub port: u16,
    /// Key the backend presents in `X-Parse-Webhook-Key` on every call.
    pub webhook_key: String,
    pub parse: ParseConnection,
    pub site_url: String,
    pub stripe_key: Option<String>,
    pub resend_key: Option<String>,
    pub mail_from: String,
}

impl EnvConfig {
    fn get_env(key: &str) -> String {
        env::var(key).unwrap_or_else(|_| panic!("Environment variable {} not set", key))
    }

    fn get_optional_env(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let parse = ParseConnection {
            server_url: Self::get_env("PARSE_SERVER_URL"),
            app_id: Self::get_env("PARSE_SERVER_APPLICATION_ID"),
            master_key: Self::get_env("PARSE_SERVER_MASTER_KEY"),
        };

        EnvConfig {
            port: Self::get_env("PORT").parse().unwrap_or(8080),
            webhook_key: Self::get_env("WEBHOOK_KEY"),
            parse,
            site_url: Self::get_env("URL_SITE"),
            stripe_key: Self::get_optional_env("STRIPE_SECRET_KEY"),
            resend_key: Self::get_optional_env("RESEND_KEY"),
            mail_from: Self::get_optional_env("MAIL_FROM_ADDRESS")
                .unwrap_or_else(|| "noreply@example.com".to_string()),
        }
    }
}

pub static CONFIG: OnceLock<EnvConfig> = OnceLock::new();

/// Loads the environment once and returns the shared config.
pub fn init() -> &'static EnvConfig {
    CONFIG.get_or_init(EnvConfig::from_env)
}
