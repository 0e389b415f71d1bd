// tests/routes.rs
use std::sync::Arc;

use actix_web::{test, web, App};
use chrono::{Duration, Utc};

use market_scanner::cache::OhlcvCache;
use market_scanner::config::settings::Settings;
use market_scanner::domain::{Candle, Symbol};
use market_scanner::exchange::mock::MockExchange;
use market_scanner::ratelimit::RateGate;
use market_scanner::routes::health::health_scope;
use market_scanner::routes::position::position_scope;
use market_scanner::routes::scan::scan_scope;
use market_scanner::scan::ExchangeContext;
use market_scanner::state::AppState;

fn test_settings() -> Settings {
    let mut settings = Settings::new().expect("settings load from defaults");
    settings.training_data_dir = std::env::temp_dir().join("market-scanner-test").to_string_lossy().to_string();
    settings
}

fn synthetic_candles(n: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;
    let start = Utc::now() - Duration::hours(n as i64);
    for i in 0..n {
        price += 0.05 + (i % 5) as f64 * 0.01;
        candles.push(Candle {
            ts: start + Duration::hours(i as i64),
            open: price - 0.1,
            high: price + 0.5,
            low: price - 0.5,
            close: price,
            volume: 100.0 + (i % 7) as f64,
        });
    }
    candles
}

fn app_state_with_mock_exchange() -> web::Data<AppState> {
    let settings = test_settings();
    let state = web::Data::new(AppState::new(settings.clone()));

    let symbol = Symbol::new("mock", "BTC/USDT");
    let adapter = MockExchange::new("mock")
        .with_markets(vec![symbol.clone()])
        .with_candles(&symbol, synthetic_candles(250));

    let ctx = ExchangeContext::new(
        Arc::new(adapter),
        OhlcvCache::new(settings.cache_ttl_secs, settings.cache_capacity),
        RateGate::new(10, 0, 0, 1, 10, 60),
    );
    state.exchanges.insert("mock".to_string(), Arc::new(ctx));
    state
}

#[actix_web::test]
async fn health_check_returns_ok() {
    let app = test::init_service(App::new().service(health_scope())).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn scan_returns_signal_for_configured_mock_exchange() {
    let state = app_state_with_mock_exchange();
    let app = test::init_service(App::new().app_data(state.clone()).service(scan_scope())).await;

    let req = test::TestRequest::post()
        .uri("/api/scanner/scan")
        .set_json(serde_json::json!({
            "timeframe": "medium",
            "exchange": "mock",
            "signal": "all",
            "minStrength": 0,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["metadata"]["count"], 1);
    assert_eq!(body["signals"][0]["symbol"], "BTC/USDT");
}

#[actix_web::test]
async fn scan_rejects_unknown_timeframe() {
    let state = app_state_with_mock_exchange();
    let app = test::init_service(App::new().app_data(state.clone()).service(scan_scope())).await;

    let req = test::TestRequest::post()
        .uri("/api/scanner/scan")
        .set_json(serde_json::json!({ "timeframe": "not-a-timeframe", "exchange": "mock" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn scan_rejects_unconfigured_exchange() {
    let state = app_state_with_mock_exchange();
    let app = test::init_service(App::new().app_data(state.clone()).service(scan_scope())).await;

    let req = test::TestRequest::post()
        .uri("/api/scanner/scan")
        .set_json(serde_json::json!({ "timeframe": "medium", "exchange": "does-not-exist" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn position_calculate_matches_worked_example() {
    let app = test::init_service(App::new().service(position_scope())).await;

    let req = test::TestRequest::post()
        .uri("/api/position/calculate")
        .set_json(serde_json::json!({
            "balance": 10000.0,
            "riskPct": 2.0,
            "entryPrice": 100.0,
            "stopLoss": 97.0,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let position_value = body["data"]["position_value"].as_f64().unwrap();
    assert!((position_value - 6666.666_666_7).abs() < 1e-2);
    assert!(body["data"]["warnings"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn position_calculate_rejects_zero_balance() {
    let app = test::init_service(App::new().service(position_scope())).await;

    let req = test::TestRequest::post()
        .uri("/api/position/calculate")
        .set_json(serde_json::json!({
            "balance": 0.0,
            "riskPct": 2.0,
            "entryPrice": 100.0,
            "stopLoss": 97.0,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
