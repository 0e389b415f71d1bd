// src/routes/training_data.rs
//
// Training-dataset export API: GET /api/scanner/training-data/{exchange}/{symbol}.

use actix_web::{get, web, HttpResponse, Scope};
use serde::Deserialize;

use crate::domain::{Symbol, Timeframe};
use crate::state::AppState;
use crate::utils::types::ApiResponse;

#[derive(Debug, Deserialize)]
struct TrainingDataQuery {
    #[serde(default = "default_days")]
    days: i64,
}

fn default_days() -> i64 {
    7
}

#[get("/{exchange}/{symbol}")]
async fn training_data(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<TrainingDataQuery>,
) -> HttpResponse {
    let (exchange, pair) = path.into_inner();
    let symbol = Symbol::new(exchange.clone(), pair.replace('-', "/"));

    match state
        .persistence
        .assemble_training_data(&exchange, &symbol, query.days, &Timeframe::CONTINUOUS_SET)
        .await
    {
        Ok(dataset) => HttpResponse::Ok().json(ApiResponse { success: true, message: None, data: Some(dataset) }),
        Err(err) => HttpResponse::InternalServerError().json(ApiResponse::<()> {
            success: false,
            message: Some(err.to_string()),
            data: None,
        }),
    }
}

pub fn training_data_scope() -> Scope {
    web::scope("/api/scanner/training-data").service(training_data)
}
