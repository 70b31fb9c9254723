pub mod health;
pub mod orders;
pub mod pricing;
pub mod receivables;
pub mod shipping;

use actix_web::web;

/// Register every HTTP route of the engine
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::controllers::configure)
        .configure(pricing::controllers::configure)
        .configure(orders::controllers::configure)
        .configure(receivables::controllers::configure)
        .configure(shipping::controllers::configure);
}
