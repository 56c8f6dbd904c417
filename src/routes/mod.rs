use crate::utils::webutils::validate_webhook_key;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub mod functions;
pub mod health;
pub mod triggers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let webhook_auth = HttpAuthentication::with_fn(validate_webhook_key);

    cfg.service(web::scope("/health").service(health::health));
    cfg.service(
        web::scope("/functions")
            .service(functions::content::delete_content_item)
            .service(functions::content::on_content_modify)
            .service(functions::invite::invite_user)
            .service(functions::account::check_password)
            .service(functions::billing::get_stripe_data)
            .service(functions::billing::save_payment_source)
            .service(functions::billing::set_default_payment_source)
            .service(functions::billing::remove_payment_source)
            .service(functions::billing::pay_subscription)
            .service(functions::billing::cancel_subscription)
            .wrap(webhook_auth.clone()),
    );
    cfg.service(
        web::scope("/triggers")
            .service(triggers::trigger)
            .wrap(webhook_auth),
    );
}
