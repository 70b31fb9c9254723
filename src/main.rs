use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_engine::config::{Config, DatabaseConfig};
use order_engine::modules::{
    self,
    orders::OrderPricingService,
    pricing::{CatalogRepository, MySqlCatalogRepository},
    receivables::{MySqlLedgerRepository, ReceivableService},
    shipping::{MySqlShippingRepository, ShippingService},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Configuration comes first: it picks the log format
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!("Starting order engine");
    tracing::info!(env = config.app.env.as_str(), "Environment");
    tracing::info!(
        utc_offset_hours = config.engine.business_utc_offset_hours,
        max_retries = config.engine.conflict_max_retries,
        "Engine settings"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    DatabaseConfig::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let retry = config.engine.retry_policy();
    let calendar = config.engine.calendar()?;

    let catalog: Arc<dyn CatalogRepository> =
        Arc::new(MySqlCatalogRepository::new(db_pool.clone()));
    let shipping_repo = Arc::new(MySqlShippingRepository::new(db_pool.clone()));
    let ledger_repo = Arc::new(MySqlLedgerRepository::new(db_pool.clone()));

    let shipping_service = Arc::new(ShippingService::new(
        shipping_repo.clone(),
        shipping_repo,
        retry,
        calendar,
    ));
    let order_service = Arc::new(OrderPricingService::new(
        catalog.clone(),
        shipping_service.clone(),
    ));
    let receivable_service = Arc::new(ReceivableService::new(ledger_repo, retry, calendar));

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::from(catalog.clone()))
            .app_data(web::Data::from(shipping_service.clone()))
            .app_data(web::Data::from(order_service.clone()))
            .app_data(web::Data::from(receivable_service.clone()))
            .configure(modules::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "order_engine={},actix_web=info",
            config.app.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.app.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
