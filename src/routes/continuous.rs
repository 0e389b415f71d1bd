// src/routes/continuous.rs
//
// Continuous-pipeline control/query API: start/stop the four background
// loops and read back their shared state.

use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse, Scope};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{MarketType, Symbol, Timeframe};
use crate::state::AppState;
use crate::utils::types::ApiResponse;

#[derive(Debug, Deserialize)]
struct StartRequestBody {
    #[serde(default = "default_primary")]
    exchange: String,
}

fn default_primary() -> String {
    "kucoinfutures".to_string()
}

#[post("/start")]
async fn start(state: web::Data<AppState>, body: Option<web::Json<StartRequestBody>>) -> HttpResponse {
    let primary_exchange = body.map(|b| b.into_inner().exchange).unwrap_or_else(default_primary);

    let contexts: HashMap<String, _> =
        state.exchanges.iter().map(|kv| (kv.key().clone(), kv.value().clone())).collect();

    let Some(primary_ctx) = contexts.get(&primary_exchange) else {
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: Some("invalid field: exchange".to_string()),
            data: None,
        });
    };

    let mut symbols = primary_ctx
        .adapter
        .fetch_markets(MarketType::Swap, "USDT")
        .await
        .unwrap_or_default();
    symbols.truncate(state.settings.max_scan_symbols);

    state
        .continuous
        .start(contexts, symbols, primary_exchange, state.persistence.clone());

    HttpResponse::Ok().json(ApiResponse { success: true, message: Some("continuous pipeline started".to_string()), data: Some(json!({})) })
}

#[post("/stop")]
async fn stop(state: web::Data<AppState>) -> HttpResponse {
    state.continuous.stop();
    HttpResponse::Ok().json(ApiResponse { success: true, message: Some("continuous pipeline stopped".to_string()), data: Some(json!({})) })
}

#[get("/status")]
async fn status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "running": state.continuous.is_running(),
        "buffer_sizes": state.continuous.buffer_sizes(),
    }))
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    symbol: Option<String>,
    timeframe: Option<String>,
    #[serde(default, rename = "minScore")]
    min_score: f64,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

#[get("/signals")]
async fn signals(state: web::Data<AppState>, query: web::Query<SignalsQuery>) -> HttpResponse {
    let timeframe = query.timeframe.as_deref().and_then(Timeframe::from_scan_request_name);
    let rows = state.continuous.recent_signals(query.symbol.as_deref(), timeframe, query.min_score, query.limit);
    let count = rows.len();
    HttpResponse::Ok().json(json!({ "signals": rows, "count": count }))
}

#[get("/market-state")]
async fn market_state(state: web::Data<AppState>) -> HttpResponse {
    match state.continuous.market_state() {
        Some(m) => HttpResponse::Ok().json(m),
        None => HttpResponse::Ok().json(json!({ "breadth_ratio": null, "message": "not yet computed" })),
    }
}

#[get("/confluence/{exchange}/{symbol}")]
async fn confluence(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HttpResponse {
    let (exchange, pair) = path.into_inner();
    let symbol = Symbol::new(exchange.clone(), pair.replace('-', "/"));
    match state.continuous.confluence(&exchange, &symbol, 50.0) {
        Some(c) => HttpResponse::Ok().json(c),
        None => HttpResponse::Ok().json(json!({ "confluence": false, "message": "insufficient multi-timeframe data" })),
    }
}

pub fn continuous_scope() -> Scope {
    web::scope("/api/scanner/continuous")
        .service(start)
        .service(stop)
        .service(status)
        .service(signals)
        .service(market_state)
        .service(confluence)
}
