// src/routes/scan.rs
//
// Scan API: POST /scan, GET /signals.

use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse, Scope};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{MarketType, Timeframe};
use crate::scan::{multi_exchange_scan, single_exchange_scan, ScanRequest, SignalFilter};
use crate::state::AppState;
use crate::utils::types::ApiResponse;

use super::wire::signal_to_wire;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExchangeSpec {
    One(String),
    Many(Vec<String>),
}

impl ExchangeSpec {
    fn into_vec(self) -> Vec<String> {
        match self {
            ExchangeSpec::One(s) => vec![s],
            ExchangeSpec::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScanRequestBody {
    #[serde(default = "default_timeframe")]
    timeframe: String,
    #[serde(default = "default_exchange")]
    exchange: ExchangeSpec,
    #[serde(default)]
    parallel: bool,
    #[serde(default = "default_signal")]
    signal: String,
    #[serde(default = "default_min_strength", rename = "minStrength")]
    min_strength: f64,
    #[serde(default = "default_true", rename = "fullAnalysis")]
    full_analysis: bool,
}

fn default_timeframe() -> String {
    "medium".to_string()
}
fn default_exchange() -> ExchangeSpec {
    ExchangeSpec::One("kucoinfutures".to_string())
}
fn default_signal() -> String {
    "all".to_string()
}
fn default_min_strength() -> f64 {
    50.0
}
fn default_true() -> bool {
    true
}

fn parse_signal_filter(raw: &str) -> Option<SignalFilter> {
    match raw.to_ascii_uppercase().as_str() {
        "ALL" => Some(SignalFilter::All),
        "BUY" => Some(SignalFilter::Buy),
        "SELL" => Some(SignalFilter::Sell),
        "HOLD" => Some(SignalFilter::Hold),
        _ => None,
    }
}

#[post("/scan")]
async fn scan(state: web::Data<AppState>, body: web::Json<ScanRequestBody>) -> HttpResponse {
    let body = body.into_inner();

    let Some(timeframe) = Timeframe::from_scan_request_name(&body.timeframe) else {
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: Some("invalid field: timeframe".to_string()),
            data: None,
        });
    };
    let Some(signal_filter) = parse_signal_filter(&body.signal) else {
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: Some("invalid field: signal".to_string()),
            data: None,
        });
    };

    let exchange_ids = body.exchange.into_vec();
    let parallel = body.parallel || exchange_ids.len() > 1;
    let candle_limit = if body.full_analysis { 300 } else { 60 };

    let req = ScanRequest {
        timeframe,
        signal_filter,
        min_strength: body.min_strength,
        top_n: state.settings.default_top_n,
        market_type: MarketType::Swap,
        quote: "USDT".to_string(),
        candle_limit,
    };

    let start = std::time::Instant::now();

    if !parallel {
        let Some(exchange_id) = exchange_ids.first() else {
            return HttpResponse::BadRequest().json(ApiResponse::<()> {
                success: false,
                message: Some("invalid field: exchange".to_string()),
                data: None,
            });
        };
        let Some(ctx) = state.exchanges.get(exchange_id).map(|e| e.clone()) else {
            return HttpResponse::BadRequest().json(ApiResponse::<()> {
                success: false,
                message: Some("invalid field: exchange".to_string()),
                data: None,
            });
        };

        let symbols = match ctx.adapter.fetch_markets(req.market_type, &req.quote).await {
            Ok(mut s) => {
                s.truncate(state.settings.max_scan_symbols);
                s
            }
            Err(err) => {
                return HttpResponse::Ok().json(json!({
                    "signals": [],
                    "metadata": {
                        "count": 0,
                        "timeframe": body.timeframe,
                        "exchange": exchange_id,
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                        "duration_seconds": start.elapsed().as_secs_f64(),
                        "performance": { "error": err.to_string() },
                        "filters_applied": { "signal": body.signal, "min_strength": body.min_strength },
                    }
                }));
            }
        };

        let outcome = single_exchange_scan(&ctx, &symbols, &req).await;
        let wire_signals: Vec<_> = outcome.signals.iter().map(|s| signal_to_wire(exchange_id, s)).collect();

        let response = json!({
            "signals": wire_signals,
            "metadata": {
                "count": outcome.signals.len(),
                "timeframe": body.timeframe,
                "exchange": exchange_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "duration_seconds": start.elapsed().as_secs_f64(),
                "performance": outcome.timing,
                "filters_applied": { "signal": body.signal, "min_strength": body.min_strength },
                "total_scanned": outcome.total_scanned,
            }
        });
        *state.last_scan.write().expect("last-scan lock poisoned") = Some(response.clone());
        return HttpResponse::Ok().json(response);
    }

    let mut contexts = HashMap::new();
    let mut failed = Vec::new();
    for exchange_id in &exchange_ids {
        let Some(ctx) = state.exchanges.get(exchange_id).map(|e| e.clone()) else {
            failed.push((exchange_id.clone(), "exchange not configured".to_string()));
            continue;
        };
        match ctx.adapter.fetch_markets(req.market_type, &req.quote).await {
            Ok(mut symbols) => {
                symbols.truncate(state.settings.max_scan_symbols);
                contexts.insert(exchange_id.clone(), (ctx, symbols));
            }
            Err(err) => failed.push((exchange_id.clone(), err.to_string())),
        }
    }

    let outcome = multi_exchange_scan(&contexts, &failed, &req).await;
    let mut all_wire = Vec::new();
    let mut count = 0usize;
    for (exchange_id, signals) in &outcome.signals {
        count += signals.len();
        all_wire.extend(signals.iter().map(|s| signal_to_wire(exchange_id, s)));
    }

    let response = json!({
        "signals": all_wire,
        "metadata": {
            "count": count,
            "timeframe": body.timeframe,
            "exchanges": exchange_ids,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "duration_seconds": start.elapsed().as_secs_f64(),
            "performance": outcome.performance,
            "filters_applied": { "signal": body.signal, "min_strength": body.min_strength },
        }
    });
    *state.last_scan.write().expect("last-scan lock poisoned") = Some(response.clone());
    HttpResponse::Ok().json(response)
}

#[derive(Debug, Deserialize)]
struct SignalsQuery {
    exchange: Option<String>,
    timeframe: Option<String>,
    signal: Option<String>,
    #[serde(rename = "minStrength")]
    min_strength: Option<f64>,
}

#[get("/signals")]
async fn signals(state: web::Data<AppState>, query: web::Query<SignalsQuery>) -> HttpResponse {
    let Some(mut payload) = state.last_scan.read().expect("last-scan lock poisoned").clone() else {
        return HttpResponse::Ok().json(json!({ "signals": [], "metadata": { "count": 0 } }));
    };

    let timeframe_filter = query.timeframe.as_deref().and_then(Timeframe::from_scan_request_name);
    let signal_filter = query.signal.as_deref().and_then(parse_signal_filter);

    let rows = payload["signals"].as_array().cloned().unwrap_or_default();
    let filtered: Vec<_> = rows
        .into_iter()
        .filter(|row| match &query.exchange {
            Some(exchange) => row["exchange"].as_str() == Some(exchange.as_str()),
            None => true,
        })
        .filter(|row| match timeframe_filter {
            Some(tf) => row["timeframe"].as_str() == Some(tf.as_str()),
            None => true,
        })
        .filter(|row| match signal_filter {
            Some(filter) => row["signal"].as_str().is_some_and(|d| filter.matches(d)),
            None => true,
        })
        .filter(|row| match query.min_strength {
            Some(min) => row["strength"].as_f64().is_some_and(|s| s >= min),
            None => true,
        })
        .collect();

    if let Some(metadata) = payload.get_mut("metadata") {
        metadata["count"] = json!(filtered.len());
    }
    payload["signals"] = json!(filtered);
    HttpResponse::Ok().json(payload)
}

pub fn scan_scope() -> Scope {
    web::scope("/api/scanner").service(scan).service(signals)
}
