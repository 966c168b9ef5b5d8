//! HTTP handler functions for the AdSpecta API.

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use adspecta_server_models::{ApiError, ApiHealth, ApiRankedLocation, PredictRequest};

use crate::AppState;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth::ok())
}

/// `POST /predict`
///
/// Ranks the locations near the requester. Returns up to ten results,
/// best first.
pub async fn predict(state: web::Data<AppState>, body: web::Json<PredictRequest>) -> HttpResponse {
    let request = body.into_inner();
    if let Err(detail) = request.validate() {
        log::debug!("Rejected predict request: {detail}");
        return HttpResponse::BadRequest().json(ApiError::new(detail));
    }

    let query = request.to_query();
    let pipeline = state.pipeline.clone();
    let dataset_path = state.dataset_path.clone();

    match web::block(move || pipeline.rank_from_path(&dataset_path, &query)).await {
        Ok(Ok(rows)) => {
            let results: Vec<ApiRankedLocation> =
                rows.into_iter().map(ApiRankedLocation::from).collect();
            HttpResponse::Ok().json(results)
        }
        Ok(Err(e)) if e.is_not_found() => {
            log::debug!("No recommendations: {e}");
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Ok(Err(e)) => {
            log::error!("Failed to score request: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Scoring task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Scoring task failed"))
        }
    }
}

/// Turns JSON extractor failures into a `400` with the usual error body.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let detail = err.to_string();
    InternalError::from_response(err, HttpResponse::BadRequest().json(ApiError::new(detail))).into()
}
