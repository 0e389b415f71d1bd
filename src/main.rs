use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use market_scanner::cache::OhlcvCache;
use market_scanner::config::settings::Settings;
use market_scanner::exchange::ccxt::CcxtStyleExchange;
use market_scanner::exchange::mock::MockExchange;
use market_scanner::exchange::ExchangeAdapter;
use market_scanner::middleware::metrics::Metrics;
use market_scanner::middleware::path_logger::PathLogger;
use market_scanner::ratelimit::RateGate;
use market_scanner::routes::{
    continuous::continuous_scope, health::health_scope, position::position_scope, scan::scan_scope,
    training_data::training_data_scope,
};
use market_scanner::scan::ExchangeContext;
use market_scanner::state::AppState;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .json()
        .init();
}

fn build_adapter(settings: &Settings) -> Arc<dyn ExchangeAdapter> {
    if settings.exchange_base_url.is_empty() {
        tracing::warn!(exchange = %settings.default_exchange, "no EXCHANGE_BASE_URL configured, booting with an empty mock adapter");
        Arc::new(MockExchange::new(settings.default_exchange.clone()))
    } else {
        Arc::new(CcxtStyleExchange::new(
            settings.default_exchange.clone(),
            settings.exchange_base_url.clone(),
            settings.fetch_timeout_secs,
        ))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load settings");
        std::process::exit(1);
    });

    if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new().install() {
        tracing::warn!(error = %e, "failed to install prometheus recorder, metrics will be dropped");
    }

    let port = settings.server_port;
    let state = web::Data::new(AppState::new(settings.clone()));

    let adapter = build_adapter(&settings);
    let gate = RateGate::new(
        settings.max_concurrent_requests,
        settings.rate_limit_delay_ms,
        settings.retry_attempts,
        settings.retry_delay_ms,
        settings.circuit_breaker_threshold,
        settings.circuit_breaker_pause_secs,
    );
    let cache = OhlcvCache::new(settings.cache_ttl_secs, settings.cache_capacity);
    let ctx = Arc::new(ExchangeContext::new(adapter, cache, gate));
    state.exchanges.insert(settings.default_exchange.clone(), ctx);

    tracing::info!(port, exchange = %settings.default_exchange, "market scanner starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Metrics)
            .wrap(PathLogger)
            .service(health_scope())
            .service(scan_scope())
            .service(continuous_scope())
            .service(training_data_scope())
            .service(position_scope())
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
