// src/routes/position.rs
//
// Position sizing API: POST /api/position/calculate.

use actix_web::{post, web, HttpResponse, Scope};
use serde::Deserialize;

use crate::scoring::position::{calculate_position_size, PositionSizeInput};
use crate::utils::types::ApiResponse;

#[derive(Debug, Deserialize)]
struct PositionRequestBody {
    balance: f64,
    #[serde(rename = "riskPct")]
    risk_pct: f64,
    #[serde(rename = "entryPrice")]
    entry_price: f64,
    #[serde(rename = "stopLoss")]
    stop_loss: f64,
    #[serde(default = "default_leverage")]
    leverage: f64,
    #[serde(default = "default_fee_rate", rename = "feeRate")]
    fee_rate: f64,
    #[serde(default = "default_true", rename = "isLong")]
    is_long: bool,
}

fn default_leverage() -> f64 {
    1.0
}
fn default_fee_rate() -> f64 {
    0.001
}
fn default_true() -> bool {
    true
}

#[post("/calculate")]
async fn calculate(body: web::Json<PositionRequestBody>) -> HttpResponse {
    let body = body.into_inner();

    if body.balance <= 0.0 || body.entry_price <= 0.0 || body.risk_pct <= 0.0 {
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: Some("invalid field: balance, entryPrice and riskPct must be positive".to_string()),
            data: None,
        });
    }
    if (body.entry_price - body.stop_loss).abs() < f64::EPSILON {
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: Some("invalid field: stopLoss must differ from entryPrice".to_string()),
            data: None,
        });
    }

    let result = calculate_position_size(PositionSizeInput {
        balance: body.balance,
        risk_pct: body.risk_pct,
        entry_price: body.entry_price,
        stop_loss: body.stop_loss,
        leverage: body.leverage,
        fee_rate: body.fee_rate,
        is_long: body.is_long,
    });

    HttpResponse::Ok().json(ApiResponse { success: true, message: None, data: Some(result) })
}

pub fn position_scope() -> Scope {
    web::scope("/api/position").service(calculate)
}
