use actix_web::{web, App, HttpServer};
use chisel_guard::billing::stripe::StripeClient;
use chisel_guard::billing::BillingProvider;
use chisel_guard::config;
use chisel_guard::db::parse_service::ParseService;
use chisel_guard::routes::configure_routes;
use chisel_guard::schema::rest::RestSchemaEndpoint;
use chisel_guard::service::{Services, Settings};
use chisel_guard::utils::mail::{Mailer, ResendMailer};
use std::sync::Arc;
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let config = config::init();
    let addr = format!("0.0.0.0:{}", config.port);

    let store = Arc::new(ParseService::new(config.parse.clone()).map_err(std::io::Error::other)?);
    let schema = Arc::new(RestSchemaEndpoint::new(config.parse.clone()).map_err(std::io::Error::other)?);

    let billing: Option<Arc<dyn BillingProvider>> = match &config.stripe_key {
        Some(key) => Some(Arc::new(StripeClient::new(key.clone()).map_err(std::io::Error::other)?)),
        None => {
            warn!("STRIPE_SECRET_KEY not set, billing functions are disabled");
            None
        }
    };
    let mailer: Option<Arc<dyn Mailer>> = match &config.resend_key {
        Some(key) => Some(Arc::new(ResendMailer::new(key.clone()).map_err(std::io::Error::other)?)),
        None => {
            warn!("RESEND_KEY not set, invites cannot be mailed");
            None
        }
    };

    let services = Arc::new(
        Services::new(store, schema, billing, mailer, Settings::from(config))
            .map_err(std::io::Error::other)?,
    );

    info!("Starting server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&services)))
            .configure(configure_routes)
    })
    .bind(addr)?
    .run()
    .await
}
